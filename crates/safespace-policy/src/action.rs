//! Remediation actions

use serde::{Deserialize, Serialize};

/// What to do with a message before producing cleaned output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemediationAction {
    /// Keep the message unchanged (non-toxic)
    Keep,

    /// Drop the message from cleaned output
    Remove,

    /// Replace the message with a rewrite preserving its intent
    Rewrite,
}

impl RemediationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Remove => "REMOVE",
            Self::Rewrite => "REWRITE",
        }
    }
}

impl std::fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision produced by the context analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDecision {
    pub action: RemediationAction,
    pub reason: String,
}

impl ContextDecision {
    /// Terminal decision for non-toxic messages
    pub fn keep() -> Self {
        Self {
            action: RemediationAction::Keep,
            reason: "not toxic".to_string(),
        }
    }

    /// Directed personal attack with nothing worth keeping
    pub fn remove() -> Self {
        Self {
            action: RemediationAction::Remove,
            reason: "personal attack, no constructive content".to_string(),
        }
    }

    /// Criticism of content, or an attack softened by constructive framing
    pub fn rewrite() -> Self {
        Self {
            action: RemediationAction::Rewrite,
            reason: "criticism of content; rewrite preserving intent".to_string(),
        }
    }

    pub fn is_rewrite(&self) -> bool {
        self.action == RemediationAction::Rewrite
    }
}
