pub mod memory;
pub mod status;
pub mod store;

pub use memory::InMemoryDocumentStore;
pub use status::{ParseWorkflowStatusError, WorkflowStatusType};
pub use store::{
    Document, DocumentStore, StoreError, WorkflowError, WorkflowStatusRecord, WorkflowStatusStore,
    WORKFLOW_STATUS_COLLECTION,
};
