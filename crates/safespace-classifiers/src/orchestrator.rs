//! Verdict orchestration
//!
//! The orchestrator always scores a message with the rule classifier, then
//! walks an ordered chain of remote strategies until one answers. The first
//! answer becomes the final verdict; if none answers, the rule verdict does.

use crate::classifier::Classifier;
use crate::rules::RuleClassifier;
use safespace_core::{ClassificationRecord, Message, RuleVerdict};
use std::sync::Arc;
use tracing::debug;

/// Merges rule and remote verdicts into one authoritative record
#[derive(Clone)]
pub struct ClassificationOrchestrator {
    rules: Arc<RuleClassifier>,
    strategies: Vec<Arc<dyn Classifier>>,
}

impl ClassificationOrchestrator {
    /// Create an orchestrator that only uses rules
    pub fn new(rules: Arc<RuleClassifier>) -> Self {
        Self {
            rules,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy to the end of the fallback chain
    pub fn with_strategy(mut self, strategy: Arc<dyn Classifier>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn rules(&self) -> &RuleClassifier {
        &self.rules
    }

    /// Names of the strategies in chain order
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Rule verdict alone, without touching any strategy
    pub fn classify_rule(&self, text: &str) -> RuleVerdict {
        self.rules.classify_rule(text)
    }

    /// Classify one message. Never fails.
    pub async fn orchestrate(&self, message: &Message) -> ClassificationRecord {
        let rule = self.rules.classify_rule(&message.text);

        for strategy in self.strategies.iter().filter(|s| s.is_available()) {
            if let Some(remote) = strategy.classify(&message.text).await {
                debug!(
                    "Message {} classified by {}: toxic={}",
                    message.id,
                    strategy.name(),
                    remote.is_toxic
                );
                return ClassificationRecord::new(message.clone(), rule, Some(remote));
            }
        }

        debug!(
            "Message {} classified by rules: toxic={}",
            message.id, rule.is_toxic
        );
        ClassificationRecord::new(message.clone(), rule, None)
    }
}

impl std::fmt::Debug for ClassificationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationOrchestrator")
            .field("rules", &self.rules.pattern_count())
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
