//! Context analysis engine
//!
//! Decides REMOVE vs REWRITE for toxic messages. The heuristic is
//! intra-message: a directed attack on a person with no constructive framing
//! is removed, everything else is rewritten. The surrounding batch is carried
//! in [`Neighborhood`] so cross-message signals (topic continuity, addressee
//! resolution) can be added without changing the call site.

use crate::action::ContextDecision;
use crate::rule::ContextLexicon;
use crate::trigger::{LexicalTriggers, TargetKind};
use safespace_core::{ClassificationRecord, Message, Result};
use std::path::Path;
use tracing::debug;

/// A message's position inside its batch
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood<'a> {
    messages: &'a [Message],
    position: usize,
}

impl<'a> Neighborhood<'a> {
    /// Wrap the full batch and the 0-based position of the message under review
    pub fn new(messages: &'a [Message], position: usize) -> Self {
        Self { messages, position }
    }

    /// A batch of one
    pub fn solitary(message: &'a Message) -> Self {
        Self {
            messages: std::slice::from_ref(message),
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn batch_len(&self) -> usize {
        self.messages.len()
    }

    /// Messages within `radius` of the position, excluding the message itself
    pub fn window(&self, radius: usize) -> impl Iterator<Item = &'a Message> + '_ {
        let start = self.position.saturating_sub(radius);
        let end = (self.position + radius + 1).min(self.messages.len());
        let position = self.position;

        self.messages
            .iter()
            .enumerate()
            .take(end)
            .skip(start)
            .filter(move |(i, _)| *i != position)
            .map(|(_, m)| m)
    }

    pub fn previous(&self) -> Option<&'a Message> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.messages.get(i))
    }

    pub fn next(&self) -> Option<&'a Message> {
        self.messages.get(self.position + 1)
    }
}

/// Lexical context analyzer
#[derive(Debug, Clone)]
pub struct ContextAnalyzer {
    triggers: LexicalTriggers,
}

impl ContextAnalyzer {
    /// Create an analyzer with the built-in lexicon
    pub fn new() -> Result<Self> {
        Self::with_lexicon(&ContextLexicon::default())
    }

    /// Create an analyzer with a custom lexicon
    pub fn with_lexicon(lexicon: &ContextLexicon) -> Result<Self> {
        Ok(Self {
            triggers: LexicalTriggers::compile(lexicon)?,
        })
    }

    /// Load the lexicon from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_lexicon(&ContextLexicon::from_file(path)?)
    }

    /// Decide what to do with a classified message.
    ///
    /// Non-toxic records are always kept.
    pub fn decide_context(
        &self,
        record: &ClassificationRecord,
        neighborhood: &Neighborhood<'_>,
    ) -> ContextDecision {
        if !record.final_is_toxic() {
            return ContextDecision::keep();
        }

        let text = &record.message().text;
        let decision = self.decide_text(text);

        debug!(
            "Message {} ({} of {}): {} ({})",
            record.message().id,
            neighborhood.position() + 1,
            neighborhood.batch_len(),
            decision.action,
            decision.reason
        );

        decision
    }

    /// Apply the target/constructive-marker heuristic to toxic text
    pub fn decide_text(&self, text: &str) -> ContextDecision {
        match self.target(text) {
            TargetKind::Person if !self.triggers.has_constructive_marker(text) => {
                ContextDecision::remove()
            }
            _ => ContextDecision::rewrite(),
        }
    }

    /// Target of a toxic message
    pub fn target(&self, text: &str) -> TargetKind {
        self.triggers.target(text)
    }

    pub fn triggers(&self) -> &LexicalTriggers {
        &self.triggers
    }
}
