//! Batch moderation pipeline
//!
//! Runs every message of a batch through classification, context analysis
//! and rewriting, then rebuilds the cleaned text in the original order.
//!
//! ```text
//! batch -> orchestrate -> (toxic) decide_context -> (REWRITE) rewrite
//!                                                          |
//!          outcomes (1:1 with input) + cleaned_text <------+
//! ```

use crate::config::EngineConfig;
use crate::state::{MessageState, StateTrail};
use crate::stats::BatchStats;
use futures::stream::{self, StreamExt};
use safespace_cache::ResponseCache;
use safespace_classifiers::{
    ClassificationOrchestrator, RemoteClassifier, RemoteClient, RewriteGenerator, RewriteOutcome,
    RuleClassifier,
};
use safespace_core::{
    ChatTransport, ClassificationRecord, DispatchLimiter, Error, Message, OpenAiTransport, Result,
    RewriteResult,
};
use safespace_policy::{ContextAnalyzer, ContextDecision, Neighborhood, RemediationAction};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything decided about one message
#[derive(Debug, Clone, Serialize)]
pub struct MessageOutcome {
    record: ClassificationRecord,
    decision: ContextDecision,
    rewrite: Option<RewriteResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    rewrite_error: Option<String>,

    states: StateTrail,
}

impl MessageOutcome {
    pub fn record(&self) -> &ClassificationRecord {
        &self.record
    }

    pub fn message(&self) -> &Message {
        self.record.message()
    }

    pub fn decision(&self) -> &ContextDecision {
        &self.decision
    }

    pub fn rewrite(&self) -> Option<&RewriteResult> {
        self.rewrite.as_ref()
    }

    /// Why a REWRITE decision produced no text
    pub fn rewrite_error(&self) -> Option<&str> {
        self.rewrite_error.as_deref()
    }

    pub fn state(&self) -> MessageState {
        self.states.current()
    }

    pub fn states(&self) -> &StateTrail {
        &self.states
    }

    /// Line contributed to the cleaned text, if any
    pub fn cleaned_line(&self) -> Option<&str> {
        match self.decision.action {
            RemediationAction::Keep => Some(&self.record.message().text),
            RemediationAction::Rewrite => self.rewrite.as_ref().map(|r| r.text.as_str()),
            RemediationAction::Remove => None,
        }
    }

    /// Classification plus rewrite tokens
    pub fn tokens_used(&self) -> u64 {
        self.record.tokens_used() + self.rewrite.as_ref().map_or(0, |r| r.tokens_used)
    }
}

/// Result of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: String,

    /// One outcome per input message, in input order
    pub outcomes: Vec<MessageOutcome>,

    /// Kept and rewritten lines joined with `\n`
    pub cleaned_text: String,

    pub stats: BatchStats,
}

/// Sequences classification, context analysis and rewriting over a batch
#[derive(Debug)]
pub struct BatchPipeline {
    orchestrator: ClassificationOrchestrator,
    analyzer: ContextAnalyzer,
    rewriter: RewriteGenerator,
    client: Arc<RemoteClient>,
    cache: Arc<ResponseCache>,
    workers: usize,
}

impl BatchPipeline {
    /// Build a pipeline talking HTTP to the configured remote service.
    ///
    /// Opens (and loads) the configured cache file.
    pub fn from_config(config: &EngineConfig, cancel: CancellationToken) -> Result<Self> {
        let transport = Arc::new(OpenAiTransport::new(&config.remote)?);
        let cache = Arc::new(ResponseCache::open(&config.cache));
        Self::new(config, transport, cache, cancel)
    }

    /// Build a pipeline over an explicit transport and cache.
    ///
    /// Once `cancel` fires no new remote call is dispatched; messages still
    /// in the batch are classified by rules.
    pub fn new(
        config: &EngineConfig,
        transport: Arc<dyn ChatTransport>,
        cache: Arc<ResponseCache>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        let rules = match &config.rules {
            Some(patterns) => RuleClassifier::with_patterns(patterns.clone())?,
            None => RuleClassifier::new()?,
        };

        let analyzer = match &config.context {
            Some(lexicon) => ContextAnalyzer::with_lexicon(lexicon)?,
            None => ContextAnalyzer::new()?,
        };

        let limiter = DispatchLimiter::new(config.pipeline.min_dispatch_interval());
        let client = Arc::new(
            RemoteClient::new(transport, config.remote.clone())
                .with_limiter(Arc::new(limiter))
                .with_cancellation(cancel),
        );

        if client.is_configured() {
            info!(
                "Remote classification via {} ({}), {}ms between calls",
                client.transport_name(),
                config.remote.model,
                config.pipeline.min_dispatch_interval_ms
            );
        } else {
            info!("No remote credentials configured, classifying with rules only");
        }

        let remote = RemoteClassifier::new(client.clone(), cache.clone());
        let orchestrator =
            ClassificationOrchestrator::new(Arc::new(rules)).with_strategy(Arc::new(remote));
        let rewriter = RewriteGenerator::new(client.clone(), cache.clone())?;

        Ok(Self {
            orchestrator,
            analyzer,
            rewriter,
            client,
            cache,
            workers: config.pipeline.workers.max(1),
        })
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn client(&self) -> &Arc<RemoteClient> {
        &self.client
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process a batch.
    ///
    /// Fails only on invalid input. Remote and cache failures degrade the
    /// result but never abort it.
    pub async fn run<S: AsRef<str>>(&self, batch: &[S]) -> Result<BatchReport> {
        if let Some(position) = batch.iter().position(|text| text.as_ref().trim().is_empty()) {
            return Err(Error::invalid_input(format!(
                "message {} is empty",
                position + 1
            )));
        }

        let start = Instant::now();
        let batch_id = uuid::Uuid::new_v4().to_string();
        let messages = Message::from_batch(batch.iter().map(|text| text.as_ref()));

        info!(
            "Processing batch {} ({} messages, {} workers)",
            batch_id,
            messages.len(),
            self.workers
        );

        let stop_flusher = CancellationToken::new();
        let flusher = self.cache.spawn_flusher(stop_flusher.clone());

        // buffered() keeps input order while running up to `workers` at once
        let outcomes: Vec<MessageOutcome> = stream::iter(messages.iter())
            .map(|message| self.process(message, &messages))
            .buffered(self.workers)
            .collect()
            .await;

        stop_flusher.cancel();
        if let Some(handle) = flusher {
            if let Err(e) = handle.await {
                warn!("Cache flusher task failed: {}", e);
            }
        }
        self.cache.flush_in_background().await;

        let cleaned_text = outcomes
            .iter()
            .filter_map(MessageOutcome::cleaned_line)
            .collect::<Vec<_>>()
            .join("\n");

        let elapsed = start.elapsed();
        let stats = BatchStats::from_outcomes(&outcomes, elapsed.as_millis() as u64);
        metrics::histogram!("safespace_batch_latency_ms").record(elapsed.as_secs_f64() * 1000.0);

        info!(
            "Batch {} finished: {} of {} toxic, {} removed, {} rewritten, {} rewrite failed in {}ms",
            batch_id,
            stats.toxic,
            stats.total,
            stats.removed,
            stats.rewritten,
            stats.rewrite_failed,
            stats.elapsed_ms
        );

        Ok(BatchReport {
            batch_id,
            outcomes,
            cleaned_text,
            stats,
        })
    }

    async fn process(&self, message: &Message, batch: &[Message]) -> MessageOutcome {
        let mut states = StateTrail::new();

        let record = self.orchestrator.orchestrate(message).await;
        states.advance(MessageState::RuleScored);
        states.advance(if record.remote().is_some() {
            MessageState::RemoteScored
        } else {
            MessageState::RemoteSkipped
        });
        states.advance(MessageState::Finalized);
        metrics::counter!("safespace_messages_total").increment(1);

        if !record.final_is_toxic() {
            record_decision(RemediationAction::Keep);
            return MessageOutcome {
                record,
                decision: ContextDecision::keep(),
                rewrite: None,
                rewrite_error: None,
                states,
            };
        }

        metrics::counter!("safespace_toxic_total").increment(1);

        let decision = self
            .analyzer
            .decide_context(&record, &Neighborhood::new(batch, message.position));
        states.advance(MessageState::ContextDecided);
        record_decision(decision.action);

        let (rewrite, rewrite_error) = match decision.action {
            RemediationAction::Remove => {
                states.advance(MessageState::Removed);
                (None, None)
            }
            RemediationAction::Rewrite => {
                let outcome = self.rewriter.attempt(message, &decision).await;
                let failure = outcome.failure_reason();

                if let RewriteOutcome::Failed(_) = &outcome {
                    warn!(
                        "Message {} judged REWRITE but the rewrite failed; dropping it from cleaned text",
                        message.id
                    );
                }

                match outcome.into_result() {
                    Some(result) => {
                        states.advance(MessageState::Rewritten);
                        (Some(result), None)
                    }
                    None => {
                        states.advance(MessageState::RewriteFailed);
                        debug!(
                            "Message {} has no rewrite: {}",
                            message.id,
                            failure.as_deref().unwrap_or("unknown")
                        );
                        (None, failure)
                    }
                }
            }
            RemediationAction::Keep => (None, None),
        };

        MessageOutcome {
            record,
            decision,
            rewrite,
            rewrite_error,
            states,
        }
    }
}

fn record_decision(action: RemediationAction) {
    metrics::counter!("safespace_decisions_total", "action" => action.as_str()).increment(1);
}
