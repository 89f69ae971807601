//! Scripted transport for testing
//!
//! Replaces the network with a closure so tests can count calls, inject
//! failures and simulate latency without a server.

#![allow(dead_code)]

use async_trait::async_trait;
use safespace_cache::{ResponseCache, TaskKind};
use safespace_classifiers::protocol::{message_of, task_of};
use safespace_classifiers::RemoteClient;
use safespace_core::{ChatCompletion, ChatRequest, ChatTransport, Error, RemoteConfig, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Responder = Box<dyn Fn(Option<TaskKind>, &str) -> Result<ChatCompletion> + Send + Sync>;

/// A chat transport answering from a closure
pub struct MockTransport {
    responder: Responder,
    latency: Option<Duration>,
    toxicity_calls: AtomicU32,
    rewrite_calls: AtomicU32,
}

impl MockTransport {
    /// Answer every request with `responder(task, message_text)`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(Option<TaskKind>, &str) -> Result<ChatCompletion> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            latency: None,
            toxicity_calls: AtomicU32::new(0),
            rewrite_calls: AtomicU32::new(0),
        }
    }

    /// A well-behaved moderator: insults are toxic, rewrites are polite
    pub fn moderator() -> Self {
        Self::new(|task, text| match task {
            Some(TaskKind::Toxicity) => {
                let lower = text.to_lowercase();
                let content = if ["idiot", "stupid", "fuck", "moron", "donkey"]
                    .iter()
                    .any(|w| lower.contains(w))
                {
                    "TOXIC: insulting language"
                } else {
                    "SAFE: no harmful content"
                };
                Ok(ChatCompletion::new(content, 42))
            }
            Some(TaskKind::Rewrite) => Ok(ChatCompletion::new(
                format!("\"Kindly put: {}\"", text.replace("stupid", "not ideal")),
                57,
            )),
            None => Err(Error::transport("unexpected request")),
        })
    }

    /// Same raw reply to every request
    pub fn replying(content: &'static str) -> Self {
        Self::new(move |_, _| Ok(ChatCompletion::new(content, 10)))
    }

    /// Every request fails at the transport level
    pub fn failing() -> Self {
        Self::new(|_, _| Err(Error::transport("HTTP 503 Service Unavailable: overloaded")))
    }

    /// Delay every reply
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> u32 {
        self.toxicity_calls() + self.rewrite_calls()
    }

    pub fn toxicity_calls(&self) -> u32 {
        self.toxicity_calls.load(Ordering::Relaxed)
    }

    pub fn rewrite_calls(&self) -> u32 {
        self.rewrite_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        let task = task_of(request);
        match task {
            Some(TaskKind::Rewrite) => self.rewrite_calls.fetch_add(1, Ordering::Relaxed),
            _ => self.toxicity_calls.fetch_add(1, Ordering::Relaxed),
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        (self.responder)(task, message_of(request).unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Remote configuration with credentials present
pub fn configured() -> RemoteConfig {
    RemoteConfig::default().with_api_key("test-key")
}

/// Client over `transport` with credentials present
pub fn client(transport: &Arc<MockTransport>) -> RemoteClient {
    RemoteClient::new(transport.clone(), configured())
}

pub fn cache() -> Arc<ResponseCache> {
    Arc::new(ResponseCache::in_memory())
}
