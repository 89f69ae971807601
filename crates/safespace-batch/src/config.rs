//! Engine configuration
//!
//! Loaded from YAML when the file exists, otherwise defaults; command-line
//! flags are applied on top:
//! ```yaml
//! remote:
//!   model: llama-3.1-8b-instant
//!   timeout_secs: 15
//! cache:
//!   path: ./safespace_cache.jsonl
//!   flush_interval_secs: 30
//! pipeline:
//!   workers: 1
//!   min_dispatch_interval_ms: 500
//! ```

use safespace_cache::PersistenceConfig;
use safespace_classifiers::RulePattern;
use safespace_core::{Error, RemoteConfig, Result};
use safespace_policy::ContextLexicon;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Full engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remote classification/rewrite service
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Response cache persistence
    #[serde(default)]
    pub cache: PersistenceConfig,

    /// Worker pool and dispatch pacing
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Replaces the built-in context lexicon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextLexicon>,

    /// Replaces the built-in rule pattern table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RulePattern>>,
}

impl EngineConfig {
    /// Load configuration from a YAML file, or defaults if it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(api_key) = &overrides.api_key {
            self.remote.api_key = Some(api_key.clone());
        }

        if let Some(workers) = overrides.workers {
            self.pipeline.workers = workers;
        }

        if overrides.no_cache {
            self.cache = PersistenceConfig::in_memory();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            return Err(Error::config("pipeline.workers must be at least 1"));
        }

        if self.remote.timeout_secs == 0 {
            return Err(Error::config("remote.timeout_secs must be at least 1"));
        }

        Ok(())
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Messages processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Minimum spacing between remote dispatches, shared by all workers
    #[serde(default = "default_min_dispatch_interval_ms")]
    pub min_dispatch_interval_ms: u64,
}

impl PipelineConfig {
    pub fn min_dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.min_dispatch_interval_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            min_dispatch_interval_ms: default_min_dispatch_interval_ms(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub workers: Option<usize>,
    pub no_cache: bool,
}

fn default_workers() -> usize {
    1
}

fn default_min_dispatch_interval_ms() -> u64 {
    500
}
