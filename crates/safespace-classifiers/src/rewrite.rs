//! Rewrite generation for REWRITE decisions
//!
//! A message is only sent to the remote model when it contains something
//! worth keeping. Purely derogatory text is suppressed up front without a
//! network call.

use crate::protocol;
use crate::remote::{self, RemoteClient};
use aho_corasick::{AhoCorasick, MatchKind};
use safespace_cache::{ResponseCache, TaskKind};
use safespace_core::{Error, Message, Result, RewriteResult};
use safespace_policy::ContextDecision;
use std::sync::Arc;
use tracing::{debug, warn};

/// Built-in constructive indicators.
///
/// Matched case-insensitively as whole words, so inflected forms are listed
/// explicitly. Greetings, gratitude, hedges and self-statements, plus markers
/// of criticism aimed at work rather than people.
pub const CONSTRUCTIVE_INDICATORS: &[&str] = &[
    // greetings and gratitude
    "hello", "hi team", "good morning", "thank", "thanks", "thank you", "thankful",
    "appreciate", "appreciated", "appreciation", "great", "nice", "welcome",
    // hedges and requests
    "but", "however", "although", "please", "hope", "hoping", "hopefully", "sorry",
    "suggest", "suggestion", "suggestions", "could we", "can we", "maybe", "help",
    "helped", "helping", "helpful",
    // self-statements
    "i am", "i'm", "i think", "i feel", "i want", "i need", "concern", "concerns",
    "concerned",
    // critique of work
    "this is", "that is", "it is", "waste of time", "idea", "ideas", "project",
    "projects", "approach", "report", "reports", "plan", "plans", "presentation",
    "meeting", "meetings", "process", "design", "code", "work", "working",
    "deadline", "deadlines", "document", "feature", "features",
];

/// What happened to one rewrite attempt
#[derive(Debug)]
pub enum RewriteOutcome {
    /// The remote model produced a valid rewrite
    Rewritten(RewriteResult),

    /// No constructive indicator; nothing worth rewriting
    Suppressed,

    /// The decision was not REWRITE
    NotRequested,

    /// The remote call failed or the reply was rejected
    Failed(Error),
}

impl RewriteOutcome {
    pub fn into_result(self) -> Option<RewriteResult> {
        match self {
            Self::Rewritten(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }

    /// Why no rewrite was produced, if none was
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Rewritten(_) => None,
            Self::Suppressed => Some("no constructive content to keep".to_string()),
            Self::NotRequested => Some("rewrite not requested".to_string()),
            Self::Failed(e) => Some(e.to_string()),
        }
    }
}

/// Produces remediation text for messages judged REWRITE
#[derive(Debug, Clone)]
pub struct RewriteGenerator {
    client: Arc<RemoteClient>,
    cache: Arc<ResponseCache>,
    indicators: AhoCorasick,
}

impl RewriteGenerator {
    /// Create a generator with the built-in indicators
    pub fn new(client: Arc<RemoteClient>, cache: Arc<ResponseCache>) -> Result<Self> {
        Self::with_indicators(client, cache, CONSTRUCTIVE_INDICATORS)
    }

    /// Create a generator with a custom indicator set
    pub fn with_indicators<S: AsRef<str>>(
        client: Arc<RemoteClient>,
        cache: Arc<ResponseCache>,
        indicators: &[S],
    ) -> Result<Self> {
        let indicators = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(indicators.iter().map(|s| s.as_ref()))
            .map_err(|e| Error::config(format!("Failed to build indicator matcher: {}", e)))?;

        Ok(Self {
            client,
            cache,
            indicators,
        })
    }

    /// Whether the text contains at least one constructive indicator
    pub fn is_salvageable(&self, text: &str) -> bool {
        let bytes = text.as_bytes();
        let is_word_byte = |i: usize| bytes.get(i).is_some_and(|b| b.is_ascii_alphanumeric());

        // Whole words only: "butt" is not "but", "helpless" is not "help"
        self.indicators.find_overlapping_iter(text).any(|m| {
            (m.start() == 0 || !is_word_byte(m.start() - 1)) && !is_word_byte(m.end())
        })
    }

    /// Rewrite a message, or `None` if no rewrite was produced
    pub async fn rewrite(
        &self,
        message: &Message,
        decision: &ContextDecision,
    ) -> Option<RewriteResult> {
        self.attempt(message, decision).await.into_result()
    }

    /// Rewrite a message, reporting why no rewrite was produced
    pub async fn attempt(&self, message: &Message, decision: &ContextDecision) -> RewriteOutcome {
        if !decision.is_rewrite() {
            return RewriteOutcome::NotRequested;
        }

        if !self.is_salvageable(&message.text) {
            debug!("Message {} is purely derogatory, rewrite suppressed", message.id);
            return RewriteOutcome::Suppressed;
        }

        match self.try_rewrite(&message.text).await {
            Ok(result) => RewriteOutcome::Rewritten(result),
            Err(Error::RemoteUnavailable) => {
                debug!("Rewrite of message {} skipped: no credentials", message.id);
                RewriteOutcome::Failed(Error::RemoteUnavailable)
            }
            Err(e) => {
                warn!("Rewrite of message {} failed: {}", message.id, e);
                remote::record_failure(TaskKind::Rewrite, &e);
                RewriteOutcome::Failed(e)
            }
        }
    }

    async fn try_rewrite(&self, text: &str) -> Result<RewriteResult> {
        if let Some(hit) = self.cache.get_rewrite(text) {
            debug!("Rewrite cache hit");
            metrics::counter!(
                "safespace_cache_hits_total",
                "task" => TaskKind::Rewrite.as_str()
            )
            .increment(1);
            return Ok(hit);
        }

        let request = protocol::rewrite_request(self.client.config(), text);
        let completion = self.client.dispatch(&request).await?;
        let rewritten = protocol::validate_rewrite(text, &completion.content)?;

        let result = RewriteResult {
            text: rewritten,
            tokens_used: completion.total_tokens,
        };

        self.cache.insert_rewrite(text, result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safespace_core::RemoteConfig;

    fn generator() -> RewriteGenerator {
        let client = RemoteClient::from_config(RemoteConfig::default()).unwrap();
        RewriteGenerator::new(Arc::new(client), Arc::new(ResponseCache::in_memory())).unwrap()
    }

    #[test]
    fn test_purely_derogatory_is_not_salvageable() {
        let g = generator();

        for text in ["go fuck yourself", "you are an idiot", "shut up bitch", "fucking moron"] {
            assert!(!g.is_salvageable(text), "{}", text);
        }
    }

    #[test]
    fn test_mixed_messages_are_salvageable() {
        let g = generator();

        for text in [
            "i am doing good. but you are behaving as shit.",
            "Hello there, you fucking idiot",
            "Thank you for your help, but you're acting like a moron",
            "I appreciate your work, but stop being such an asshole",
            "This is stupid and a waste of time.",
        ] {
            assert!(g.is_salvageable(text), "{}", text);
        }
    }

    #[test]
    fn test_indicators_anchor_at_word_start() {
        let g = generator();

        // "network" must not count as "work"
        assert!(!g.is_salvageable("network idiot"));
        assert!(g.is_salvageable("WORKING with you is awful"));
    }

    #[test]
    fn test_indicators_must_end_at_word_boundary() {
        let g = generator();

        for text in [
            "kiss my butt, stupid",
            "helpless loser",
            "greatest moron alive",
            "hopeless idiot",
        ] {
            assert!(!g.is_salvageable(text), "{}", text);
        }
        assert!(g.is_salvageable("thanks, moron"));
        assert!(g.is_salvageable("that was helpful, idiot"));
        assert!(g.is_salvageable("great."));
    }

    #[tokio::test]
    async fn test_not_requested_for_remove() {
        let g = generator();
        let message = Message::new(0, "Thank you, idiot");

        let outcome = g.attempt(&message, &ContextDecision::remove()).await;
        assert!(matches!(outcome, RewriteOutcome::NotRequested));
    }

    #[tokio::test]
    async fn test_no_credentials_fails_without_cached_rewrite() {
        let g = generator();
        let message = Message::new(0, "This is stupid and a waste of time.");

        let outcome = g.attempt(&message, &ContextDecision::rewrite()).await;
        assert!(matches!(outcome, RewriteOutcome::Failed(Error::RemoteUnavailable)));
    }
}
