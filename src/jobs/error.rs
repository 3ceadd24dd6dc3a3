use thiserror::Error;

/// Failures talking to the external job system.
///
/// These are external-system failures: they carry enough context to
/// diagnose (operation, HTTP status) and are not retried at this layer —
/// the poller applies its own bounded per-job retry budget.
#[derive(Debug, Error)]
pub enum JobClientError {
    #[error("job API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse job API response: {0}")]
    Parse(String),
}
