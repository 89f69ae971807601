//! Cache file persistence
//!
//! The cache is stored as JSON lines, one record per distinct key:
//! ```text
//! {"key":"9f86d0...","task":"toxicity","value":{"kind":"verdict","is_toxic":true,...}}
//! ```
//! The whole file is read at startup and rewritten as a full snapshot on
//! flush. Snapshots go to a sibling temp file first and are renamed into
//! place.

use crate::cache::CachedValue;
use crate::key::TaskKind;
use safespace_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration for cache persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Cache file; `None` keeps the cache in memory only
    #[serde(default = "default_path")]
    pub path: Option<PathBuf>,

    /// Background flush period in seconds, 0 disables the flusher
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl PersistenceConfig {
    /// Persist to the given file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }

    /// Memory-only cache
    pub fn in_memory() -> Self {
        Self {
            path: None,
            flush_interval_secs: 0,
        }
    }

    /// Background flush period, if enabled
    pub fn flush_interval(&self) -> Option<Duration> {
        match (self.path.is_some(), self.flush_interval_secs) {
            (true, secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => None,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    Some(PathBuf::from("./safespace_cache.jsonl"))
}

fn default_flush_interval_secs() -> u64 {
    30
}

/// One persisted cache record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: String,
    pub task: TaskKind,
    pub value: CachedValue,
}

/// Read every record from a cache file.
///
/// A missing file yields an empty map. An unreadable file or any malformed
/// line is a `CacheLoad` error.
pub fn load_records(path: &Path) -> Result<HashMap<String, CacheRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No cache file at {:?}, starting empty", path);
            return Ok(HashMap::new());
        }
        Err(e) => return Err(Error::CacheLoad(format!("{}: {}", path.display(), e))),
    };

    let mut records = HashMap::new();
    let reader = BufReader::new(file);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::CacheLoad(format!("{}: {}", path.display(), e)))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: CacheRecord = serde_json::from_str(&line).map_err(|e| {
            Error::CacheLoad(format!("{}:{}: {}", path.display(), line_no + 1, e))
        })?;

        records.insert(record.key.clone(), record);
    }

    Ok(records)
}

/// Write a full snapshot, replacing the file atomically
pub fn write_snapshot<'a, I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a CacheRecord>,
{
    let tmp_path = tmp_path_for(path);

    let written = write_records(&tmp_path, records).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        Error::CacheWrite(format!("{}: {}", tmp_path.display(), e))
    })?;

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::CacheWrite(format!("{}: {}", path.display(), e)))?;

    Ok(written)
}

fn write_records<'a, I>(path: &Path, records: I) -> std::io::Result<usize>
where
    I: IntoIterator<Item = &'a CacheRecord>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut count = 0;

    for record in records {
        let json = serde_json::to_string(record)?;
        writeln!(writer, "{}", json)?;
        count += 1;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(count)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "safespace_cache".into());
    name.push(".tmp");
    path.with_file_name(name)
}
