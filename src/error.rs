use thiserror::Error;

use crate::jobs::JobClientError;
use crate::workflow::{StoreError, WorkflowError};

#[derive(Debug, Error)]
pub enum FlowstatError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Job client error: {0}")]
    JobClient(#[from] JobClientError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
