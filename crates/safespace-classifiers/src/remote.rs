//! Remote classification
//!
//! [`RemoteClient`] owns everything between "we want to ask the model" and the
//! network: credentials, cancellation, dispatch pacing and the hard timeout.
//! [`RemoteClassifier`] layers the cache and the reply protocol on top and
//! collapses every failure to `None`.

use crate::classifier::Classifier;
use crate::protocol::{self, REMOTE_CONFIDENCE};
use async_trait::async_trait;
use safespace_cache::{ResponseCache, TaskKind};
use safespace_core::{
    ChatCompletion, ChatRequest, ChatTransport, DispatchLimiter, Error, OpenAiTransport,
    RemoteConfig, RemoteVerdict, Result,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Gatekeeper for every call to the remote service
pub struct RemoteClient {
    transport: Arc<dyn ChatTransport>,
    config: RemoteConfig,
    timeout: Duration,
    limiter: Arc<DispatchLimiter>,
    cancel: CancellationToken,
    dispatched: AtomicU64,
}

impl RemoteClient {
    /// Create a client over an arbitrary transport.
    ///
    /// No pacing is applied until a limiter is attached.
    pub fn new(transport: Arc<dyn ChatTransport>, config: RemoteConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout(),
            config,
            limiter: Arc::new(DispatchLimiter::unlimited()),
            cancel: CancellationToken::new(),
            dispatched: AtomicU64::new(0),
        }
    }

    /// Create a client talking HTTP to the configured endpoint
    pub fn from_config(config: RemoteConfig) -> Result<Self> {
        let transport = OpenAiTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Share a dispatch limiter with other clients
    pub fn with_limiter(mut self, limiter: Arc<DispatchLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Stop dispatching once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Whether credentials are present
    pub fn is_configured(&self) -> bool {
        self.config.has_credentials()
    }

    /// Number of requests handed to the transport so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Send one request.
    ///
    /// Refuses with [`Error::Cancelled`] once the batch is cancelled. The wait
    /// for a dispatch slot and the round trip share one timeout budget. A call
    /// already handed to the transport is never cancelled; on timeout it is
    /// dropped and reported as [`Error::RemoteTimeout`].
    pub async fn dispatch(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        if !self.is_configured() {
            return Err(Error::RemoteUnavailable);
        }

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let call = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                _ = self.limiter.acquire() => {}
            }

            self.dispatched.fetch_add(1, Ordering::Relaxed);
            self.transport.complete(request).await
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::RemoteTimeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("transport", &self.transport.name())
            .field("model", &self.config.model)
            .field("configured", &self.is_configured())
            .field("timeout", &self.timeout)
            .field("dispatched", &self.dispatched())
            .finish()
    }
}

/// Remote toxicity classifier with a content-addressed cache in front
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: Arc<RemoteClient>,
    cache: Arc<ResponseCache>,
}

impl RemoteClassifier {
    pub fn new(client: Arc<RemoteClient>, cache: Arc<ResponseCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &Arc<RemoteClient> {
        &self.client
    }

    /// Classify remotely, or `None` if the remote path could not answer
    pub async fn classify_remote(&self, text: &str) -> Option<RemoteVerdict> {
        match self.try_classify(text).await {
            Ok(verdict) => Some(verdict),
            Err(Error::RemoteUnavailable) => {
                debug!("Remote classification skipped: no credentials");
                None
            }
            Err(e) => {
                warn!("Remote classification failed, using rules: {}", e);
                record_failure(TaskKind::Toxicity, &e);
                None
            }
        }
    }

    /// Classify remotely, keeping the failure cause
    pub async fn try_classify(&self, text: &str) -> Result<RemoteVerdict> {
        if !self.client.is_configured() {
            return Err(Error::RemoteUnavailable);
        }

        if let Some(verdict) = self.cache.get_verdict(text) {
            debug!("Toxicity cache hit");
            metrics::counter!(
                "safespace_cache_hits_total",
                "task" => TaskKind::Toxicity.as_str()
            )
            .increment(1);
            return Ok(verdict);
        }

        let request = protocol::toxicity_request(self.client.config(), text);
        let completion = self.client.dispatch(&request).await?;
        let reply = protocol::parse_toxicity_reply(&completion.content)?;

        let verdict = RemoteVerdict {
            is_toxic: reply.is_toxic(),
            confidence: REMOTE_CONFIDENCE,
            reason: reply.into_reason(),
            tokens_used: completion.total_tokens,
        };

        self.cache.insert_verdict(text, verdict.clone());
        Ok(verdict)
    }
}

/// Count a failed remote call for `task`.
///
/// Missing credentials mean the remote path is switched off, not that it
/// failed, so they are not counted. Returns whether the failure was counted.
pub(crate) fn record_failure(task: TaskKind, error: &Error) -> bool {
    if matches!(error, Error::RemoteUnavailable) {
        return false;
    }

    metrics::counter!("safespace_remote_failures_total", "task" => task.as_str()).increment(1);
    true
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Option<RemoteVerdict> {
        self.classify_remote(text).await
    }

    fn name(&self) -> &str {
        "remote"
    }

    fn is_available(&self) -> bool {
        self.client.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_are_not_failures() {
        for task in [TaskKind::Toxicity, TaskKind::Rewrite] {
            assert!(!record_failure(task, &Error::RemoteUnavailable));
            assert!(record_failure(task, &Error::RemoteTimeout(Duration::from_secs(15))));
            assert!(record_failure(task, &Error::Cancelled));
        }
    }
}
