use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::JobClientError;

/// Opaque identifier handed out by the external job system on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status reported by the job system for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Failed,
    Completed,
}

impl RunStatus {
    /// FAILED and COMPLETED are terminal; a terminal job leaves the
    /// still-running set and is never queried again.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Failed => write!(f, "FAILED"),
            RunStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// A unit of work to submit to the job system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    #[serde(default)]
    pub context: serde_json::Value,
}

/// One poll answer for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Outcome of draining a set of submitted jobs.
///
/// `submitted` is the original id list; `completed` and `failed` partition
/// the terminal jobs; `running_at_deadline` holds the ids still outstanding
/// when a configured deadline expired (empty on the unbounded path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsPollingResult {
    pub submitted: Vec<JobId>,
    pub completed: Vec<JobStatusResponse>,
    pub failed: Vec<JobStatusResponse>,
    pub running_at_deadline: Vec<JobId>,
}

impl JobsPollingResult {
    pub fn fully_drained(&self) -> bool {
        self.running_at_deadline.is_empty()
    }
}

/// The external job system as this crate consumes it.
pub trait JobService {
    async fn submit(&self, spec: &JobSpec) -> Result<JobId, JobClientError>;

    async fn get_status(&self, id: &JobId) -> Result<JobStatusResponse, JobClientError>;
}
