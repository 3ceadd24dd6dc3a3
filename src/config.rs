//! Configuration loaded from `flowstat.toml`.
//!
//! [`FlowstatConfig`] holds every tunable parameter. Values absent from the
//! file fall back to defaults. The `FLOWSTAT_POLL_INTERVAL_MS` environment
//! variable takes precedence over the file.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::jobs::PollConfig;

/// Top-level configuration loaded from `flowstat.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowstatConfig {
    /// Base URL of the external job service.
    #[serde(default = "default_job_service_url")]
    pub job_service_url: String,

    /// API key sent to the job service, if any.
    #[serde(default)]
    pub api_key: String,

    /// Delay between status polling rounds, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on the polling delay once backoff is enabled.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// Random jitter added to each polling delay, in milliseconds.
    #[serde(default)]
    pub poll_jitter_ms: u64,

    /// Overall polling deadline in seconds. `None` polls until drained.
    #[serde(default)]
    pub poll_deadline_secs: Option<u64>,

    /// Consecutive status-query failures tolerated per job before the job
    /// is classified as failed.
    #[serde(default = "default_query_retry_limit")]
    pub query_retry_limit: u32,

    /// Document collection holding workflow status records.
    #[serde(default = "default_workflow_collection")]
    pub workflow_collection: String,
}

// Default job service endpoint: local development instance.
fn default_job_service_url() -> String {
    "http://localhost:8080".to_string()
}

// Default polling interval: 1000ms, fixed-rate (max equals base).
fn default_poll_interval_ms() -> u64 {
    1000
}

// Default query failure budget: 3 consecutive failures.
fn default_query_retry_limit() -> u32 {
    3
}

fn default_workflow_collection() -> String {
    crate::workflow::WORKFLOW_STATUS_COLLECTION.to_string()
}

impl Default for FlowstatConfig {
    fn default() -> Self {
        Self {
            job_service_url: default_job_service_url(),
            api_key: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_interval_ms: default_poll_interval_ms(),
            poll_jitter_ms: 0,
            poll_deadline_secs: None,
            query_retry_limit: default_query_retry_limit(),
            workflow_collection: default_workflow_collection(),
        }
    }
}

impl FlowstatConfig {
    /// Loads the configuration from `flowstat.toml` in the current directory.
    /// Falls back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("flowstat.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<FlowstatConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for the polling interval.
        if let Ok(raw) = std::env::var("FLOWSTAT_POLL_INTERVAL_MS")
            && let Ok(ms) = raw.parse::<u64>()
        {
            config.poll_interval_ms = ms;
            config.poll_max_interval_ms = config.poll_max_interval_ms.max(ms);
        }

        Ok(config)
    }

    /// Polling parameters derived from this configuration.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_interval: Duration::from_millis(self.poll_max_interval_ms.max(self.poll_interval_ms)),
            jitter_ms: self.poll_jitter_ms,
            deadline: self.poll_deadline_secs.map(Duration::from_secs),
            query_retry_limit: self.query_retry_limit,
        }
    }
}
