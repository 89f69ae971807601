//! Batch statistics

use crate::pipeline::MessageOutcome;
use safespace_core::VerdictSource;
use safespace_policy::RemediationAction;
use serde::Serialize;
use std::fmt;

/// Summary of one batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub toxic: usize,
    pub safe: usize,

    pub kept: usize,
    pub removed: usize,
    pub rewritten: usize,

    /// REWRITE decisions that produced no text (suppressed or failed)
    pub rewrite_failed: usize,

    /// Final verdict came from the remote service
    pub remote_scored: usize,

    /// Final verdict came from the rule classifier
    pub rule_fallback: usize,

    /// Classification plus rewrite tokens
    pub tokens_used: u64,

    pub elapsed_ms: u64,
}

impl BatchStats {
    /// Derive statistics from an outcome list
    pub fn from_outcomes(outcomes: &[MessageOutcome], elapsed_ms: u64) -> Self {
        let mut stats = Self {
            total: outcomes.len(),
            elapsed_ms,
            ..Self::default()
        };

        for outcome in outcomes {
            let record = outcome.record();

            if record.final_is_toxic() {
                stats.toxic += 1;
            } else {
                stats.safe += 1;
            }

            match record.final_source() {
                VerdictSource::Remote => stats.remote_scored += 1,
                VerdictSource::Rule => stats.rule_fallback += 1,
            }

            match outcome.decision().action {
                RemediationAction::Keep => stats.kept += 1,
                RemediationAction::Remove => stats.removed += 1,
                RemediationAction::Rewrite if outcome.rewrite().is_some() => stats.rewritten += 1,
                RemediationAction::Rewrite => stats.rewrite_failed += 1,
            }

            stats.tokens_used += outcome.tokens_used();
        }

        stats
    }

    /// Fraction of messages judged toxic
    pub fn toxic_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.toxic as f64 / self.total as f64
        }
    }

    pub fn avg_tokens_per_message(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.tokens_used as f64 / self.total as f64
        }
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Messages:      {}", self.total)?;
        writeln!(
            f,
            "Toxic:         {} ({:.1}%)",
            self.toxic,
            self.toxic_rate() * 100.0
        )?;
        writeln!(f, "Safe:          {}", self.safe)?;
        writeln!(
            f,
            "Actions:       {} kept, {} removed, {} rewritten, {} rewrite failed",
            self.kept, self.removed, self.rewritten, self.rewrite_failed
        )?;
        writeln!(
            f,
            "Verdicts:      {} remote, {} rule fallback",
            self.remote_scored, self.rule_fallback
        )?;
        writeln!(
            f,
            "Tokens:        {} ({:.1} per message)",
            self.tokens_used,
            self.avg_tokens_per_message()
        )?;
        write!(f, "Elapsed:       {} ms", self.elapsed_ms)
    }
}
