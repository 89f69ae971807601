//! SafeSpace Batch
//!
//! Batch moderation pipeline. Takes an ordered sequence of messages, returns
//! one outcome per message plus the cleaned text:
//! - Classification: remote verdict preferred, rule verdict as fallback
//! - Context analysis: REMOVE for directed attacks, REWRITE for criticism
//! - Rewriting: constructive rephrasing, cached across runs
//!
//! The `safespace` binary wraps this crate for line-oriented input.

pub mod config;
pub mod pipeline;
pub mod state;
pub mod stats;

pub use config::{ConfigOverrides, EngineConfig, PipelineConfig};
pub use pipeline::{BatchPipeline, BatchReport, MessageOutcome};
pub use state::{MessageState, StateTrail};
pub use stats::BatchStats;
