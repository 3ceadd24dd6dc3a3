//! Status aggregation and asynchronous completion tracking for data
//! ingestion pipelines.
//!
//! Three pieces work together:
//!
//! - [`batch`] — per-record status tracking for one indexing batch, where
//!   severity only escalates and every batch resolves to a terminal state.
//! - [`jobs`] — submission and drain-loop polling of an external job
//!   service until every job reaches a terminal status.
//! - [`workflow`] — the `SUBMITTED → RUNNING → {FINISHED, FAILED}` run
//!   lifecycle persisted in a document store with application-enforced
//!   uniqueness.

pub mod batch;
pub mod config;
pub mod error;
pub mod jobs;
pub mod workflow;

pub use config::FlowstatConfig;
pub use error::FlowstatError;
