//! Workflow status persistence against an external document store.
//!
//! The backing store offers query-by-field but no schema-level uniqueness,
//! no transactions and no compare-and-swap, so every invariant that a
//! storage engine would normally enforce is re-derived here on each access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::WorkflowStatusType;

/// Collection holding one document per workflow run.
pub const WORKFLOW_STATUS_COLLECTION: &str = "workflow-status";

pub const FIELD_WORKFLOW_ID: &str = "workflow_id";
pub const FIELD_STATUS: &str = "status";

/// A stored document: backend-assigned id plus its JSON fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub fields: serde_json::Value,
}

/// Failures of the store backend itself, wrapped with the operation and the
/// key being touched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store {operation} failed for {key}: {message}")]
    Backend {
        operation: &'static str,
        key: String,
        message: String,
    },

    #[error("document {doc_id} not found in collection {collection}")]
    MissingDocument { collection: String, doc_id: String },
}

/// The external document store as this crate consumes it.
///
/// Deliberately capability-level: `insert`, query-by-field, single-field
/// update. Nothing here promises uniqueness or atomicity.
pub trait DocumentStore {
    async fn insert(
        &self,
        collection: &str,
        fields: serde_json::Value,
    ) -> Result<String, StoreError>;

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError>;

    async fn update_field(
        &self,
        collection: &str,
        doc_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;
}

/// One workflow run as persisted. Records are never deleted; terminal
/// records remain as the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatusRecord {
    pub workflow_id: String,
    pub run_id: String,
    pub status: WorkflowStatusType,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    /// Backend document id; filled on read, not part of the stored fields.
    #[serde(skip)]
    pub doc_id: String,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow status for workflow id {workflow_id} not found")]
    NotFound { workflow_id: String },

    #[error("workflow status for workflow id {workflow_id} already exists")]
    AlreadyExists { workflow_id: String },

    #[error(
        "query by workflow id {workflow_id} returned {count} documents, expected at most 1"
    )]
    ConsistencyViolation { workflow_id: String, count: usize },

    #[error("workflow {workflow_id} cannot move from {from} to {to}")]
    InvalidTransition {
        workflow_id: String,
        from: WorkflowStatusType,
        to: WorkflowStatusType,
    },

    #[error("malformed workflow status document {doc_id}: {message}")]
    Malformed { doc_id: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates, finds and transitions [`WorkflowStatusRecord`]s.
pub struct WorkflowStatusStore<S: DocumentStore> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> WorkflowStatusStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_collection(store, WORKFLOW_STATUS_COLLECTION)
    }

    pub fn with_collection(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Inserts the initial SUBMITTED record for a workflow.
    ///
    /// Precondition: no record exists for `workflow_id`. The check runs
    /// through [`find`](Self::find) and therefore also trips on an already
    /// inconsistent store.
    pub async fn create(
        &self,
        workflow_id: &str,
        run_id: &str,
        submitted_by: Option<&str>,
    ) -> Result<WorkflowStatusRecord, WorkflowError> {
        if self.find(workflow_id).await?.is_some() {
            return Err(WorkflowError::AlreadyExists {
                workflow_id: workflow_id.to_string(),
            });
        }

        let mut record = WorkflowStatusRecord {
            workflow_id: workflow_id.to_string(),
            run_id: run_id.to_string(),
            status: WorkflowStatusType::Submitted,
            submitted_at: Utc::now(),
            submitted_by: submitted_by.map(str::to_string),
            doc_id: String::new(),
        };

        let fields = serde_json::to_value(&record).map_err(|e| WorkflowError::Malformed {
            doc_id: String::new(),
            message: e.to_string(),
        })?;
        record.doc_id = self.store.insert(&self.collection, fields).await?;

        tracing::info!(
            target: "flowstat::workflow",
            workflow_id,
            run_id,
            "workflow status created as SUBMITTED"
        );
        Ok(record)
    }

    /// Point query by workflow id.
    ///
    /// Exactly zero or one record may exist; two or more is a consistency
    /// violation and is reported as such, never resolved by picking one.
    pub async fn find(
        &self,
        workflow_id: &str,
    ) -> Result<Option<WorkflowStatusRecord>, WorkflowError> {
        let mut documents = self
            .store
            .query(&self.collection, FIELD_WORKFLOW_ID, workflow_id)
            .await?;

        if documents.len() > 1 {
            return Err(WorkflowError::ConsistencyViolation {
                workflow_id: workflow_id.to_string(),
                count: documents.len(),
            });
        }

        match documents.pop() {
            None => Ok(None),
            Some(doc) => {
                let mut record: WorkflowStatusRecord = serde_json::from_value(doc.fields)
                    .map_err(|e| WorkflowError::Malformed {
                        doc_id: doc.id.clone(),
                        message: e.to_string(),
                    })?;
                record.doc_id = doc.id;
                Ok(Some(record))
            }
        }
    }

    /// Transitions a workflow to `new_status`, writing only the status
    /// field and returning the updated view.
    ///
    /// Re-asserting the stored status is rejected as an invalid transition
    /// (distinct from a no-op), and terminal records accept no update at
    /// all. The read-then-write is not atomic: two concurrent callers can
    /// both observe SUBMITTED and both write RUNNING — the backing store
    /// offers no compare-and-swap to close that window.
    pub async fn update(
        &self,
        workflow_id: &str,
        new_status: WorkflowStatusType,
    ) -> Result<WorkflowStatusRecord, WorkflowError> {
        let mut record =
            self.find(workflow_id)
                .await?
                .ok_or_else(|| WorkflowError::NotFound {
                    workflow_id: workflow_id.to_string(),
                })?;

        if !record.status.can_transition_to(new_status) {
            return Err(WorkflowError::InvalidTransition {
                workflow_id: workflow_id.to_string(),
                from: record.status,
                to: new_status,
            });
        }

        self.store
            .update_field(
                &self.collection,
                &record.doc_id,
                FIELD_STATUS,
                &new_status.to_string(),
            )
            .await?;

        tracing::info!(
            target: "flowstat::workflow",
            workflow_id,
            from = %record.status,
            to = %new_status,
            "workflow status updated"
        );
        record.status = new_status;
        Ok(record)
    }
}
