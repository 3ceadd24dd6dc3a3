use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-record indexing outcome, ordered by severity.
///
/// The order is total and has no ties:
/// `PROCESSING < SUCCESS < WARN < SKIP < FAIL`.
/// When the same record is reported more than once, the worse status wins
/// and a status never improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexingStatus {
    Processing,
    Success,
    Warn,
    Skip,
    Fail,
}

impl IndexingStatus {
    /// Position in the severity order. Higher is worse.
    pub const fn severity(self) -> u8 {
        match self {
            IndexingStatus::Processing => 0,
            IndexingStatus::Success => 1,
            IndexingStatus::Warn => 2,
            IndexingStatus::Skip => 3,
            IndexingStatus::Fail => 4,
        }
    }

    /// True iff `self` is strictly worse than `other`.
    ///
    /// This is the only gate deciding whether an incoming update may
    /// overwrite a stored status.
    pub const fn is_worse_than(self, other: IndexingStatus) -> bool {
        self.severity() > other.severity()
    }

    /// A record in a terminal status receives no further automatic updates
    /// from finalization.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, IndexingStatus::Processing)
    }
}

impl fmt::Display for IndexingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexingStatus::Processing => write!(f, "PROCESSING"),
            IndexingStatus::Success => write!(f, "SUCCESS"),
            IndexingStatus::Warn => write!(f, "WARN"),
            IndexingStatus::Skip => write!(f, "SKIP"),
            IndexingStatus::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown indexing status: {0}")]
pub struct ParseIndexingStatusError(String);

impl FromStr for IndexingStatus {
    type Err = ParseIndexingStatusError;

    // Case-insensitive: status strings arrive from external payloads in
    // mixed casing. Internal code compares enum values only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PROCESSING" => Ok(IndexingStatus::Processing),
            "SUCCESS" => Ok(IndexingStatus::Success),
            "WARN" => Ok(IndexingStatus::Warn),
            "SKIP" => Ok(IndexingStatus::Skip),
            "FAIL" => Ok(IndexingStatus::Fail),
            _ => Err(ParseIndexingStatusError(s.to_string())),
        }
    }
}

/// The kind of record operation a batch item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
    Purge,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Create => write!(f, "create"),
            OperationType::Update => write!(f, "update"),
            OperationType::Delete => write!(f, "delete"),
            OperationType::Purge => write!(f, "purge"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown operation type: {0}")]
pub struct ParseOperationTypeError(String);

impl FromStr for OperationType {
    type Err = ParseOperationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(OperationType::Create),
            "update" => Ok(OperationType::Update),
            "delete" => Ok(OperationType::Delete),
            "purge" => Ok(OperationType::Purge),
            _ => Err(ParseOperationTypeError(s.to_string())),
        }
    }
}
