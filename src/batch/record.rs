use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{IndexingStatus, OperationType};

/// One item of a batch as announced by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub id: String,
    pub kind: String,
    pub op: OperationType,
}

/// Progress metadata attached to a tracked record.
///
/// The trace is append-only and insertion-ordered; "latest" means the last
/// appended element, read without removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexProgress {
    pub trace: Vec<String>,
    pub status_code: i32,
    pub last_update: DateTime<Utc>,
}

impl IndexProgress {
    pub fn new() -> Self {
        Self {
            trace: Vec::new(),
            status_code: 0,
            last_update: Utc::now(),
        }
    }

    pub fn push_trace(&mut self, message: &str) {
        self.trace.push(message.to_string());
    }

    pub fn latest_trace(&self) -> Option<&str> {
        self.trace.last().map(String::as_str)
    }
}

impl Default for IndexProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// The tracked state of one work item within a batch.
///
/// `kind` and `operation_type` are `None` for entries created leniently from
/// a late or out-of-order event whose id was never announced via
/// [`RecordInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatus {
    pub id: String,
    pub kind: Option<String>,
    pub operation_type: Option<OperationType>,
    pub status: IndexingStatus,
    pub progress: IndexProgress,
}

impl RecordStatus {
    /// Entry for an announced batch item; starts in PROCESSING with an
    /// empty trace.
    pub fn tracked(info: &RecordInfo) -> Self {
        Self {
            id: info.id.clone(),
            kind: Some(info.kind.clone()),
            operation_type: Some(info.op),
            status: IndexingStatus::Processing,
            progress: IndexProgress::new(),
        }
    }

    /// Entry created directly from an event for an unknown id.
    pub fn lenient(id: &str, status: IndexingStatus) -> Self {
        Self {
            id: id.to_string(),
            kind: None,
            operation_type: None,
            status,
            progress: IndexProgress::new(),
        }
    }
}
