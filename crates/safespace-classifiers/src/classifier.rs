//! Classifier strategy trait

use async_trait::async_trait;
use safespace_core::RemoteVerdict;

/// One fallible strategy in the orchestrator's fallback chain.
///
/// A strategy answers `None` whenever it cannot produce a useful verdict;
/// failure causes are logged by the strategy itself and never surface to
/// the caller. The rule classifier is not a strategy: it is the orchestrator's
/// total fallback.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Option<RemoteVerdict>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Whether the strategy is configured well enough to be attempted
    fn is_available(&self) -> bool {
        true
    }
}
