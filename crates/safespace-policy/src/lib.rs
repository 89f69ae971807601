//! SafeSpace Policy
//!
//! Context analysis for toxic messages. Decides whether a toxic message is
//! removed outright or rewritten into constructive phrasing.
//!
//! The decision is driven by a [`ContextLexicon`] that can be loaded from
//! YAML and specifies:
//! - Forms of direct and third-person address
//! - High-severity insult terms
//! - Hedge words and task nouns that signal constructive framing

pub mod action;
pub mod engine;
pub mod rule;
pub mod trigger;

pub use action::{ContextDecision, RemediationAction};
pub use engine::{ContextAnalyzer, Neighborhood};
pub use rule::ContextLexicon;
pub use trigger::{LexicalTriggers, TargetKind};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::{ContextDecision, RemediationAction};
    pub use crate::engine::{ContextAnalyzer, Neighborhood};
    pub use crate::rule::ContextLexicon;
    pub use crate::trigger::TargetKind;
}
