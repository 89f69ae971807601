//! Shared response cache
//!
//! One [`ResponseCache`] is built at process start and handed by `Arc` to
//! every component that talks to the remote service. Reads vastly outnumber
//! writes; a single `RwLock` over the map is enough to rule out lost updates
//! between parallel workers.

use crate::key::{cache_key, TaskKind};
use crate::persistence::{self, CacheRecord, PersistenceConfig};
use parking_lot::{Mutex, RwLock};
use safespace_core::{RemoteVerdict, Result, RewriteResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A cached remote answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CachedValue {
    Verdict(RemoteVerdict),
    Rewrite(RewriteResult),
}

/// Content-addressed store for remote classification and rewrite outputs
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheRecord>>,
    path: Option<PathBuf>,
    flush_interval: Option<Duration>,

    /// Bumped on every insert
    generation: AtomicU64,

    /// Generation covered by the last successful flush
    flushed_generation: AtomicU64,

    /// Serializes snapshot writers
    flush_lock: Mutex<()>,
}

impl ResponseCache {
    /// Open a cache, loading the persisted file if one is configured.
    ///
    /// Never fails: a corrupt or unreadable file is logged and the cache
    /// starts empty.
    pub fn open(config: &PersistenceConfig) -> Self {
        let entries = match config.path.as_deref() {
            Some(path) => match persistence::load_records(path) {
                Ok(records) => {
                    info!("Loaded {} cache entries from {:?}", records.len(), path);
                    records
                }
                Err(e) => {
                    warn!("Starting with an empty cache: {}", e);
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };

        Self {
            entries: RwLock::new(entries),
            path: config.path.clone(),
            flush_interval: config.flush_interval(),
            generation: AtomicU64::new(0),
            flushed_generation: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        }
    }

    /// Cache that is never persisted
    pub fn in_memory() -> Self {
        Self::open(&PersistenceConfig::in_memory())
    }

    /// Look up a cached value
    pub fn get(&self, task: TaskKind, text: &str) -> Option<CachedValue> {
        let key = cache_key(task, text);
        self.entries.read().get(&key).map(|record| record.value.clone())
    }

    /// Cached remote verdict for this text
    pub fn get_verdict(&self, text: &str) -> Option<RemoteVerdict> {
        match self.get(TaskKind::Toxicity, text)? {
            CachedValue::Verdict(verdict) => Some(verdict),
            CachedValue::Rewrite(_) => None,
        }
    }

    /// Cached rewrite for this text
    pub fn get_rewrite(&self, text: &str) -> Option<RewriteResult> {
        match self.get(TaskKind::Rewrite, text)? {
            CachedValue::Rewrite(rewrite) => Some(rewrite),
            CachedValue::Verdict(_) => None,
        }
    }

    /// Insert or replace a value
    pub fn insert(&self, task: TaskKind, text: &str, value: CachedValue) {
        let key = cache_key(task, text);
        let record = CacheRecord {
            key: key.clone(),
            task,
            value,
        };

        self.entries.write().insert(key, record);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn insert_verdict(&self, text: &str, verdict: RemoteVerdict) {
        self.insert(TaskKind::Toxicity, text, CachedValue::Verdict(verdict));
    }

    pub fn insert_rewrite(&self, text: &str, rewrite: RewriteResult) {
        self.insert(TaskKind::Rewrite, text, CachedValue::Rewrite(rewrite));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether inserts happened since the last successful flush
    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::Acquire) > self.flushed_generation.load(Ordering::Acquire)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Configured background flush period
    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval
    }

    /// Write a full snapshot to disk.
    ///
    /// Returns the number of records written, 0 when the cache is memory-only
    /// or nothing changed since the last flush.
    pub fn flush(&self) -> Result<usize> {
        let Some(path) = self.path.as_deref() else {
            return Ok(0);
        };

        let _guard = self.flush_lock.lock();
        if !self.is_dirty() {
            return Ok(0);
        }

        let (generation, snapshot) = {
            let entries = self.entries.read();
            let generation = self.generation.load(Ordering::Acquire);
            let mut snapshot: Vec<CacheRecord> = entries.values().cloned().collect();
            snapshot.sort_by(|a, b| a.key.cmp(&b.key));
            (generation, snapshot)
        };

        let written = persistence::write_snapshot(path, &snapshot)?;
        self.flushed_generation.fetch_max(generation, Ordering::AcqRel);

        debug!("Flushed {} cache entries to {:?}", written, path);
        Ok(written)
    }

    /// Flush on a blocking thread, logging instead of returning errors
    pub async fn flush_in_background(self: &Arc<Self>) {
        let cache = Arc::clone(self);
        match tokio::task::spawn_blocking(move || cache.flush()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Cache flush failed: {}", e),
            Err(e) => warn!("Cache flush task failed: {}", e),
        }
    }

    /// Spawn the periodic flusher.
    ///
    /// Returns `None` when no flush interval is configured. The task exits
    /// after one last flush once `cancel` fires.
    pub fn spawn_flusher(self: &Arc<Self>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let period = self.flush_interval?;
        let cache = Arc::clone(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => cache.flush_in_background().await,
                }
            }

            cache.flush_in_background().await;
            debug!("Cache flusher stopped");
        }))
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.len())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn verdict(is_toxic: bool) -> RemoteVerdict {
        RemoteVerdict {
            is_toxic,
            confidence: 0.95,
            reason: "remote reason".to_string(),
            tokens_used: 60,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ResponseCache::in_memory();
        assert!(cache.is_empty());

        cache.insert_verdict("You're an idiot", verdict(true));
        cache.insert_rewrite(
            "This is stupid",
            RewriteResult {
                text: "I have concerns about this.".to_string(),
                tokens_used: 30,
            },
        );

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_verdict("you're an  IDIOT"), Some(verdict(true)));
        assert_eq!(cache.get_rewrite("this is stupid").unwrap().tokens_used, 30);

        // Same text, other task
        assert!(cache.get_rewrite("You're an idiot").is_none());
        assert!(cache.get_verdict("This is stupid").is_none());
    }

    #[test]
    fn test_round_trip_across_restart() {
        let temp_dir = TempDir::new().unwrap();
        let config = PersistenceConfig::at(temp_dir.path().join("cache.jsonl"));

        {
            let cache = ResponseCache::open(&config);
            cache.insert_verdict("Great job on the presentation", verdict(false));
            cache.insert_rewrite(
                "This is stupid and a waste of time.",
                RewriteResult {
                    text: "I'm not sure this is the best use of our time.".to_string(),
                    tokens_used: 44,
                },
            );
            assert_eq!(cache.flush().unwrap(), 2);
        }

        let reloaded = ResponseCache::open(&config);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get_verdict("Great job on the presentation"),
            Some(verdict(false))
        );
        assert_eq!(
            reloaded
                .get_rewrite("This is stupid and a waste of time.")
                .unwrap()
                .text,
            "I'm not sure this is the best use of our time."
        );
        assert!(!reloaded.is_dirty());
    }

    #[test]
    fn test_flush_skips_when_clean() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResponseCache::open(&PersistenceConfig::at(temp_dir.path().join("c.jsonl")));

        assert_eq!(cache.flush().unwrap(), 0);

        cache.insert_verdict("hello", verdict(false));
        assert!(cache.is_dirty());
        assert_eq!(cache.flush().unwrap(), 1);
        assert!(!cache.is_dirty());
        assert_eq!(cache.flush().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.jsonl");
        std::fs::write(&path, "this is not a cache\n").unwrap();

        let cache = ResponseCache::open(&PersistenceConfig::at(&path));
        assert!(cache.is_empty());

        // Still usable, and the next flush replaces the corrupt file
        cache.insert_verdict("hello", verdict(false));
        cache.flush().unwrap();
        assert_eq!(ResponseCache::open(&PersistenceConfig::at(&path)).len(), 1);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = temp_dir.path().join("occupied");
        std::fs::create_dir_all(path.join("child")).unwrap();

        let cache = ResponseCache::open(&PersistenceConfig::at(&path));
        cache.insert_verdict("hello", verdict(false));

        let err = cache.flush().unwrap_err();
        assert!(matches!(err, safespace_core::Error::CacheWrite(_)));
        assert!(cache.is_dirty());
    }

    #[test]
    fn test_memory_only_flush_is_noop() {
        let cache = ResponseCache::in_memory();
        cache.insert_verdict("hello", verdict(false));

        assert_eq!(cache.flush().unwrap(), 0);
        assert!(cache.flush_interval().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_are_not_lost() {
        let cache = Arc::new(ResponseCache::in_memory());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for i in 0..50 {
                        let text = format!("worker {} message {}", worker, i);
                        cache.insert_verdict(&text, verdict(i % 2 == 0));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.len(), 400);
    }

    #[tokio::test]
    async fn test_flusher_persists_on_cancel() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = PersistenceConfig::at(temp_dir.path().join("cache.jsonl"));
        config.flush_interval_secs = 3600;

        let cache = Arc::new(ResponseCache::open(&config));
        let cancel = CancellationToken::new();
        let handle = cache.spawn_flusher(cancel.clone()).unwrap();

        cache.insert_verdict("hello team", verdict(false));
        cancel.cancel();
        handle.await.unwrap();

        assert!(!cache.is_dirty());
        assert_eq!(ResponseCache::open(&config).len(), 1);
    }
}
