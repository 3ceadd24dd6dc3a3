use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of one workflow run.
///
/// The machine is `SUBMITTED → RUNNING → {FINISHED, FAILED}`; FINISHED and
/// FAILED are terminal and accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatusType {
    Submitted,
    Running,
    Finished,
    Failed,
}

impl WorkflowStatusType {
    pub const fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatusType::Finished | WorkflowStatusType::Failed)
    }

    /// Whether an update from `self` to `next` is permitted.
    ///
    /// Re-asserting the current status is rejected (it is not a no-op), and
    /// terminal statuses accept nothing. The external runner may fail or
    /// finish a workflow this store never observed in RUNNING, so forward
    /// jumps out of SUBMITTED are allowed.
    pub fn can_transition_to(self, next: WorkflowStatusType) -> bool {
        !self.is_terminal() && self != next
    }
}

impl fmt::Display for WorkflowStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatusType::Submitted => write!(f, "SUBMITTED"),
            WorkflowStatusType::Running => write!(f, "RUNNING"),
            WorkflowStatusType::Finished => write!(f, "FINISHED"),
            WorkflowStatusType::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown workflow status: {0}")]
pub struct ParseWorkflowStatusError(String);

impl FromStr for WorkflowStatusType {
    type Err = ParseWorkflowStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUBMITTED" => Ok(WorkflowStatusType::Submitted),
            "RUNNING" => Ok(WorkflowStatusType::Running),
            "FINISHED" => Ok(WorkflowStatusType::Finished),
            "FAILED" => Ok(WorkflowStatusType::Failed),
            _ => Err(ParseWorkflowStatusError(s.to_string())),
        }
    }
}
