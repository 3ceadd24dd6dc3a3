pub mod client;
pub mod error;
pub mod poller;
pub mod types;

pub use client::HttpJobClient;
pub use error::JobClientError;
pub use poller::{JobPoller, PollConfig};
pub use types::{JobId, JobService, JobSpec, JobStatusResponse, JobsPollingResult, RunStatus};
