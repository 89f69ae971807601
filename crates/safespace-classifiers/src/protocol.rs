//! Wire contract with the remote model
//!
//! The remote service answers toxicity questions in free text. The only thing
//! holding the protocol together is the literal `TOXIC:` / `SAFE:` prefix, so
//! every prompt, parser and validator for the remote side lives here.

use safespace_cache::TaskKind;
use safespace_core::{ChatRequest, Error, RemoteConfig, Result};

/// Reply prefix for a toxic verdict
pub const TOXIC_PREFIX: &str = "TOXIC:";

/// Reply prefix for a safe verdict
pub const SAFE_PREFIX: &str = "SAFE:";

/// Confidence assigned to every successful remote verdict
pub const REMOTE_CONFIDENCE: f32 = 0.95;

/// Minimum length, in characters, a rewrite must exceed
pub const MIN_REWRITE_CHARS: usize = 5;

pub const TOXICITY_SYSTEM_PROMPT: &str = "\
You are an expert content moderator. Analyze the message for harassment, toxicity, hate speech, or harmful content.

Consider context and intent carefully. Be precise and avoid false positives.

Respond with EXACTLY this format:
TOXIC: [brief reason] OR SAFE: [brief reason]

Be especially careful with:
- Casual language that might seem rude but isn't harmful
- Context-dependent statements
- Sarcasm or humor
- Animal comparisons used as insults";

pub const REWRITE_SYSTEM_PROMPT: &str = "\
You are an empathetic communication coach. Rewrite the given message so it is respectful while keeping everything that is constructive in it.

Guidelines:
- Keep greetings, thanks, questions and any legitimate criticism of work or ideas
- Replace only the toxic, insulting or profane parts
- Keep the same structure, meaning and roughly the same length
- Make it sound natural and human

Respond with ONLY the rewritten message, nothing else.";

const TOXICITY_USER_PREFIX: &str = "Analyze this message: '";
const REWRITE_USER_PREFIX: &str = "Rewrite this message to be more empathetic and respectful: '";

/// Build the toxicity request for `text`
pub fn toxicity_request(config: &RemoteConfig, text: &str) -> ChatRequest {
    ChatRequest::new(TOXICITY_SYSTEM_PROMPT, format!("{}{}'", TOXICITY_USER_PREFIX, text))
        .with_max_tokens(config.classify_max_tokens)
        .with_temperature(config.classify_temperature)
}

/// Build the rewrite request for `text`
pub fn rewrite_request(config: &RemoteConfig, text: &str) -> ChatRequest {
    ChatRequest::new(REWRITE_SYSTEM_PROMPT, format!("{}{}'", REWRITE_USER_PREFIX, text))
        .with_max_tokens(config.rewrite_max_tokens)
        .with_temperature(config.rewrite_temperature)
}

/// Which task a request was built for
pub fn task_of(request: &ChatRequest) -> Option<TaskKind> {
    let system = request.messages.first().filter(|m| m.role == "system")?;

    match system.content.as_str() {
        TOXICITY_SYSTEM_PROMPT => Some(TaskKind::Toxicity),
        REWRITE_SYSTEM_PROMPT => Some(TaskKind::Rewrite),
        _ => None,
    }
}

/// The message text embedded in a request built by this module
pub fn message_of(request: &ChatRequest) -> Option<&str> {
    let user = request.user_content();

    user.strip_prefix(TOXICITY_USER_PREFIX)
        .or_else(|| user.strip_prefix(REWRITE_USER_PREFIX))
        .and_then(|rest| rest.strip_suffix('\''))
}

/// Parsed toxicity reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToxicityReply {
    Toxic(String),
    Safe(String),
}

impl ToxicityReply {
    pub fn is_toxic(&self) -> bool {
        matches!(self, Self::Toxic(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Toxic(reason) | Self::Safe(reason) => reason,
        }
    }

    pub fn into_reason(self) -> String {
        match self {
            Self::Toxic(reason) | Self::Safe(reason) => reason,
        }
    }
}

/// Parse a toxicity reply.
///
/// The reply must start with `TOXIC:` or `SAFE:` (case-sensitive) after
/// trimming. Anything else is a [`Error::RemoteParse`].
pub fn parse_toxicity_reply(content: &str) -> Result<ToxicityReply> {
    let content = content.trim();

    if let Some(reason) = content.strip_prefix(TOXIC_PREFIX) {
        Ok(ToxicityReply::Toxic(reason.trim().to_string()))
    } else if let Some(reason) = content.strip_prefix(SAFE_PREFIX) {
        Ok(ToxicityReply::Safe(reason.trim().to_string()))
    } else {
        Err(Error::parse(format!(
            "expected '{}' or '{}' prefix, got {:?}",
            TOXIC_PREFIX,
            SAFE_PREFIX,
            truncate(content, 60)
        )))
    }
}

/// Validate a rewrite reply against the text it replaces.
///
/// Strips enclosing quotes, then requires the result to be longer than
/// [`MIN_REWRITE_CHARS`] and to differ from the original ignoring case.
pub fn validate_rewrite(original: &str, reply: &str) -> Result<String> {
    let rewritten = reply
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\u{201C}' | '\u{201D}'))
        .trim();

    if rewritten.chars().count() <= MIN_REWRITE_CHARS {
        return Err(Error::rejected(format!(
            "rewrite too short ({} chars)",
            rewritten.chars().count()
        )));
    }

    if rewritten.to_lowercase() == original.trim().to_lowercase() {
        return Err(Error::rejected("rewrite identical to original"));
    }

    Ok(rewritten.to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
