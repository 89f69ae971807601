//! Scripted remote service for pipeline tests

#![allow(dead_code)]

use async_trait::async_trait;
use safespace_batch::EngineConfig;
use safespace_cache::{PersistenceConfig, TaskKind};
use safespace_classifiers::protocol::{message_of, task_of};
use safespace_core::{ChatCompletion, ChatRequest, ChatTransport, Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub const TEAM_CHAT: [&str; 6] = [
    "Hello team, hope everyone is doing well today!",
    "Great job on the presentation yesterday.",
    "You're an idiot and I hate working with you.",
    "Thanks for helping with the project.",
    "This is stupid and a waste of time.",
    "I appreciate everyone's collaboration.",
];

pub const TEAM_CHAT_REWRITE: &str = "I'm not sure this is the best use of our time.";

/// Moderator double: insults are toxic, rewrites come from a fixed table
pub struct ScriptedModerator {
    fail_all: bool,
    jitter: bool,
    toxicity_calls: AtomicU32,
    rewrite_calls: AtomicU32,
}

impl ScriptedModerator {
    pub fn new() -> Self {
        Self {
            fail_all: false,
            jitter: false,
            toxicity_calls: AtomicU32::new(0),
            rewrite_calls: AtomicU32::new(0),
        }
    }

    /// Every call fails at the transport level
    pub fn down() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    /// Delay replies by a few milliseconds depending on the text
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
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

    fn answer(task: Option<TaskKind>, text: &str) -> Result<ChatCompletion> {
        match task {
            Some(TaskKind::Toxicity) => {
                let lower = text.to_lowercase();
                if lower.contains("idiot") || lower.contains("stupid") {
                    Ok(ChatCompletion::new("TOXIC: insulting language", 40))
                } else {
                    Ok(ChatCompletion::new("SAFE: constructive message", 35))
                }
            }
            Some(TaskKind::Rewrite) if text == TEAM_CHAT[4] => {
                Ok(ChatCompletion::new(format!("\"{}\"", TEAM_CHAT_REWRITE), 60))
            }
            Some(TaskKind::Rewrite) => Ok(ChatCompletion::new(
                format!("Kindly: {}", text.replace("stupid", "not ideal")),
                60,
            )),
            None => Err(Error::transport("unexpected request")),
        }
    }
}

#[async_trait]
impl ChatTransport for ScriptedModerator {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        let task = task_of(request);
        let text = message_of(request).unwrap_or_default();

        match task {
            Some(TaskKind::Rewrite) => self.rewrite_calls.fetch_add(1, Ordering::Relaxed),
            _ => self.toxicity_calls.fetch_add(1, Ordering::Relaxed),
        };

        if self.jitter {
            let millis = (text.len() % 5) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }

        if self.fail_all {
            return Err(Error::transport("connection refused"));
        }

        Self::answer(task, text)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Configuration with credentials, no pacing and a memory-only cache
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.remote.api_key = Some("test-key".to_string());
    config.pipeline.min_dispatch_interval_ms = 0;
    config.cache = PersistenceConfig::in_memory();
    config
}
