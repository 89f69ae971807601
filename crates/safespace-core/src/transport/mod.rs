//! Chat-completion transport
//!
//! The remote classifier and the rewrite generator talk to the remote model
//! through [`ChatTransport`]. The production implementation is
//! [`OpenAiTransport`]; tests substitute scripted transports.

mod openai;

pub use openai::OpenAiTransport;

use crate::types::ChatMessage;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One chat-completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    /// Request with a system instruction and a single user turn
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: 100,
            temperature: 0.1,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Content of the final user turn
    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map_or("", |m| m.content.as_str())
    }
}

/// Reply from the remote model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    /// Assistant content, trimmed
    pub content: String,

    /// Total tokens billed, 0 when the service does not report usage
    pub total_tokens: u64,
}

impl ChatCompletion {
    pub fn new(content: impl Into<String>, total_tokens: u64) -> Self {
        Self {
            content: content.into(),
            total_tokens,
        }
    }
}

/// Network client abstraction for the remote service
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request and wait for the full reply
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
