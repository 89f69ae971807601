//! SafeSpace Classifiers
//!
//! Toxicity classification and remediation text for short messages.
//!
//! Components, leaves first:
//! - [`RuleClassifier`]: deterministic, local pattern table; never fails
//! - [`RemoteClassifier`]: asks a remote model, collapses failures to `None`
//! - [`ClassificationOrchestrator`]: prefers the remote verdict, degrades to rules
//! - [`RewriteGenerator`]: rewrites salvageable toxic messages
//!
//! All remote traffic goes through [`RemoteClient`], which applies the
//! credentials check, batch cancellation, dispatch pacing and the timeout.

pub mod classifier;
pub mod orchestrator;
pub mod protocol;
pub mod remote;
pub mod rewrite;
pub mod rules;

pub use classifier::Classifier;
pub use orchestrator::ClassificationOrchestrator;
pub use protocol::{parse_toxicity_reply, validate_rewrite, ToxicityReply};
pub use remote::{RemoteClassifier, RemoteClient};
pub use rewrite::{RewriteGenerator, RewriteOutcome, CONSTRUCTIVE_INDICATORS};
pub use rules::{default_patterns, RuleClassifier, RulePattern};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::Classifier;
    pub use crate::orchestrator::ClassificationOrchestrator;
    pub use crate::remote::{RemoteClassifier, RemoteClient};
    pub use crate::rewrite::{RewriteGenerator, RewriteOutcome};
    pub use crate::rules::RuleClassifier;
}
