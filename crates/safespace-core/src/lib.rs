//! SafeSpace Core
//!
//! Core types, traits, and utilities shared across SafeSpace components.
//!
//! This crate provides:
//! - The message and verdict data model handed between pipeline stages
//! - Error types and result handling
//! - Remote service configuration
//! - The chat-completion transport used by the remote classifier and rewriter
//! - Dispatch pacing for the remote service's rate limit

pub mod config;
pub mod error;
pub mod limiter;
pub mod transport;
pub mod types;

pub use config::RemoteConfig;
pub use error::{Error, Result};
pub use limiter::DispatchLimiter;
pub use transport::{ChatCompletion, ChatRequest, ChatTransport, OpenAiTransport};
pub use types::{
    ChatMessage, ClassificationRecord, Message, RemoteVerdict, RewriteResult, RuleVerdict,
    VerdictSource,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::transport::{ChatCompletion, ChatRequest, ChatTransport};
    pub use crate::types::{
        ClassificationRecord, Message, RemoteVerdict, RewriteResult, RuleVerdict, VerdictSource,
    };
}
