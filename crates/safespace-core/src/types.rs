//! Core types for SafeSpace

use serde::{Deserialize, Serialize};

/// A single message in a batch.
///
/// Identity is `(batch, position)`; the id is the 1-based position and only
/// meaningful inside the batch that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// 1-based id, batch-local
    pub id: usize,

    /// Raw message text
    pub text: String,

    /// 0-based position in the batch
    pub position: usize,
}

impl Message {
    /// Create a message at the given 0-based position
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            id: position + 1,
            text: text.into(),
            position,
        }
    }

    /// Build messages for an ordered batch of texts
    pub fn from_batch<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(position, text)| Self::new(position, text))
            .collect()
    }
}

/// Verdict of the local pattern classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub is_toxic: bool,

    /// Maximum confidence over all matched patterns (0.0-1.0)
    pub confidence: f32,

    /// Description of the highest-confidence match
    pub reason: String,
}

/// Verdict returned by the remote classification service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVerdict {
    pub is_toxic: bool,
    pub confidence: f32,
    pub reason: String,

    /// Tokens billed for the call, 0 when the transport does not report usage
    #[serde(default)]
    pub tokens_used: u64,
}

/// Which classifier produced the final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    Remote,
    Rule,
}

impl VerdictSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Rule => "rule",
        }
    }
}

/// Authoritative classification of one message.
///
/// Fields are private so the record cannot drift from the invariant
/// `final_source == Remote` iff `remote.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRecord {
    message: Message,
    final_is_toxic: bool,
    final_confidence: f32,
    final_source: VerdictSource,
    rule: RuleVerdict,
    remote: Option<RemoteVerdict>,
}

impl ClassificationRecord {
    /// Build a record, preferring the remote verdict when present
    pub fn new(message: Message, rule: RuleVerdict, remote: Option<RemoteVerdict>) -> Self {
        let (final_is_toxic, final_confidence, final_source) = match &remote {
            Some(remote) => (remote.is_toxic, remote.confidence, VerdictSource::Remote),
            None => (rule.is_toxic, rule.confidence, VerdictSource::Rule),
        };

        Self {
            message,
            final_is_toxic,
            final_confidence,
            final_source,
            rule,
            remote,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn final_is_toxic(&self) -> bool {
        self.final_is_toxic
    }

    pub fn final_confidence(&self) -> f32 {
        self.final_confidence
    }

    pub fn final_source(&self) -> VerdictSource {
        self.final_source
    }

    pub fn rule(&self) -> &RuleVerdict {
        &self.rule
    }

    pub fn remote(&self) -> Option<&RemoteVerdict> {
        self.remote.as_ref()
    }

    /// Reason attached to the final verdict
    pub fn final_reason(&self) -> &str {
        match &self.remote {
            Some(remote) => &remote.reason,
            None => &self.rule.reason,
        }
    }

    /// Tokens spent classifying this message
    pub fn tokens_used(&self) -> u64 {
        self.remote.as_ref().map_or(0, |r| r.tokens_used)
    }
}

/// Remediation text produced for a REWRITE decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub text: String,

    #[serde(default)]
    pub tokens_used: u64,
}

/// A chat message sent to the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}
