//! Content-addressed cache keys

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of remote task a cached value answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Toxicity,
    Rewrite,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toxicity => "toxicity",
            Self::Rewrite => "rewrite",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize text for keying: trimmed, lower-cased, whitespace runs collapsed
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex SHA-256 of the task kind and normalized text
pub fn cache_key(task: TaskKind, text: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(task.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize(text).as_bytes());

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello   Team\tToday \n"), "hello team today");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_key_ignores_case_and_spacing() {
        let a = cache_key(TaskKind::Toxicity, "You're an  IDIOT");
        let b = cache_key(TaskKind::Toxicity, "you're an idiot ");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_separates_tasks() {
        let text = "This is stupid and a waste of time.";

        assert_ne!(
            cache_key(TaskKind::Toxicity, text),
            cache_key(TaskKind::Rewrite, text)
        );
    }
}
