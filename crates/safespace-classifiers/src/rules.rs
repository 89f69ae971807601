//! Rule-based toxicity classifier
//!
//! Deterministic, local and total. This is the fallback of last resort when
//! the remote classifier is unavailable, so it must never fail or block.

use regex::{Regex, RegexBuilder};
use safespace_core::{Error, Result, RuleVerdict};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Confidence reported when no pattern matches
pub const NO_MATCH_CONFIDENCE: f32 = 0.3;

/// Reason reported when no pattern matches
pub const NO_MATCH_REASON: &str = "No toxic patterns detected by rules";

/// One entry of the pattern table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePattern {
    /// Regular expression, matched case-insensitively
    pub pattern: String,

    /// Confidence when matched (0.0-1.0)
    pub confidence: f32,

    /// Human-readable description of the match
    pub reason: String,
}

impl RulePattern {
    pub fn new(pattern: impl Into<String>, confidence: f32, reason: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            confidence,
            reason: reason.into(),
        }
    }
}

/// Built-in pattern table, in declaration order
pub fn default_patterns() -> Vec<RulePattern> {
    vec![
        RulePattern::new(
            r"\b(idiot|stupid|dumb|moron|retard|fool|loser)\b",
            0.9,
            "Contains direct insults",
        ),
        RulePattern::new(
            r"\b(donkey|pig|dog|rat|snake)\s+you\b",
            0.95,
            "Uses animal comparison as insult",
        ),
        RulePattern::new(
            r"\byou.*\b(donkey|pig|dog|rat|snake)\b",
            0.95,
            "Uses animal comparison as insult",
        ),
        RulePattern::new(
            r"\b(damn|hell|crap|shit|fuck)(s|ed|er|ers|ing|ty)?\b",
            0.7,
            "Contains profanity",
        ),
        RulePattern::new(
            r"\b(shut up|go away|get lost|kill yourself)\b",
            0.8,
            "Dismissive/aggressive language",
        ),
        RulePattern::new(
            r"\b(ugly|fat|worthless|pathetic|disgusting)\b",
            0.85,
            "Personal attack language",
        ),
        RulePattern::new(r"\bhate\s+(you|u)\b", 0.8, "Hostility toward a person"),
        RulePattern::new(
            r"\b(intelligence|iq|brain|smart|clever).*\b(lacking|missing|absent|zero|none)\b",
            0.8,
            "Intelligence attack",
        ),
        RulePattern::new(
            r"\b(fastest sperm|mess.*up|messed up)\b",
            0.85,
            "Personal/biological insult",
        ),
        RulePattern::new(
            r"\b(install.*intelligence|firmware|database|storage|corruption)\b",
            0.75,
            "Tech metaphor insult",
        ),
    ]
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    regex: Regex,
    confidence: f32,
    reason: String,
}

/// Pattern-table classifier
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    patterns: Vec<CompiledPattern>,
}

impl RuleClassifier {
    /// Create a classifier with the built-in pattern table
    pub fn new() -> Result<Self> {
        Self::with_patterns(default_patterns())
    }

    /// Create a classifier from a custom pattern table
    pub fn with_patterns(patterns: Vec<RulePattern>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                if !(0.0..=1.0).contains(&p.confidence) {
                    return Err(Error::config(format!(
                        "Rule '{}' has confidence {} outside 0.0-1.0",
                        p.reason, p.confidence
                    )));
                }

                let regex = RegexBuilder::new(&p.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        Error::config(format!("Invalid rule pattern '{}': {}", p.pattern, e))
                    })?;

                Ok(CompiledPattern {
                    regex,
                    confidence: p.confidence,
                    reason: p.reason,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Load a pattern table from a YAML list
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let patterns: Vec<RulePattern> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid rule table: {}", e)))?;
        Self::with_patterns(patterns)
    }

    /// Load a pattern table from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Score text against every pattern.
    ///
    /// Confidence is the maximum over matched patterns; ties go to the pattern
    /// declared first.
    pub fn classify_rule(&self, text: &str) -> RuleVerdict {
        let normalized = text.to_lowercase();

        let best = self
            .patterns
            .iter()
            .filter(|p| p.regex.is_match(&normalized))
            .fold(None::<&CompiledPattern>, |best, p| match best {
                Some(b) if b.confidence >= p.confidence => Some(b),
                _ => Some(p),
            });

        match best {
            Some(p) => RuleVerdict {
                is_toxic: true,
                confidence: p.confidence,
                reason: p.reason.clone(),
            },
            None => RuleVerdict {
                is_toxic: false,
                confidence: NO_MATCH_CONFIDENCE,
                reason: NO_MATCH_REASON.to_string(),
            },
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}
