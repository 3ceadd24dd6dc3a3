//! The drain loop over submitted jobs.
//!
//! One call blocks a single task for the whole polling duration (seconds to
//! minutes), suspending only at the inter-round wait. Calls over disjoint
//! job-id sets are fully independent and may run concurrently.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use super::error::JobClientError;
use super::types::{JobId, JobService, JobSpec, JobStatusResponse, JobsPollingResult, RunStatus};

/// Tuning for [`JobPoller`].
///
/// The defaults reproduce the observed base behavior: a fixed 1000 ms wait
/// between rounds, no jitter, no deadline. Raising `max_interval` enables
/// exponential backoff; setting `deadline` bounds the wait.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Wait between polling rounds.
    pub interval: Duration,
    /// Cap for the backoff-grown wait. Equal to `interval` means fixed-rate.
    pub max_interval: Duration,
    /// Upper bound of the uniform random addition to each wait, in ms.
    pub jitter_ms: u64,
    /// Total time budget for one drain. `None` polls until every job is
    /// terminal.
    pub deadline: Option<Duration>,
    /// Consecutive status-query failures tolerated per job before the job is
    /// classified as failed.
    pub query_retry_limit: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(1000),
            jitter_ms: 0,
            deadline: None,
            query_retry_limit: 3,
        }
    }
}

/// Submits work to the external job system and synchronously drains the
/// submitted set to terminal states.
pub struct JobPoller<S: JobService> {
    service: S,
    config: PollConfig,
}

impl<S: JobService> JobPoller<S> {
    pub fn new(service: S, config: PollConfig) -> Self {
        Self { service, config }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submits every spec in order, returning the ids in matching order.
    /// The first submission failure aborts; nothing submitted earlier is
    /// rolled back (the caller still holds those ids for a later drain).
    pub async fn submit_all(&self, specs: &[JobSpec]) -> Result<Vec<JobId>, JobClientError> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            ids.push(self.service.submit(spec).await?);
        }
        Ok(ids)
    }

    /// Polls every still-running job each round, regroups by reported
    /// status, and moves terminal jobs out of the running set until it is
    /// empty or the deadline expires.
    ///
    /// Status-query failures are tolerated up to `query_retry_limit`
    /// consecutive times per job; past that the job is classified as failed
    /// with the error text as its details. On deadline expiry the remaining
    /// ids are returned in `running_at_deadline` — the caller gets the full
    /// partial classification, never a hang. Dropping the future cancels
    /// the drain; the caller keeps the original id list.
    pub async fn await_completion(&self, job_ids: &[JobId]) -> JobsPollingResult {
        let submitted = job_ids.to_vec();
        let mut running = job_ids.to_vec();
        let mut completed: Vec<JobStatusResponse> = Vec::new();
        let mut failed: Vec<JobStatusResponse> = Vec::new();
        let mut query_failures: HashMap<JobId, u32> = HashMap::new();

        let started = Instant::now();
        let mut delay = self.config.interval;

        while !running.is_empty() {
            let mut still_running = Vec::with_capacity(running.len());

            for id in &running {
                match self.service.get_status(id).await {
                    Ok(resp) => {
                        query_failures.remove(id);
                        match resp.status {
                            RunStatus::Running => still_running.push(id.clone()),
                            RunStatus::Failed => {
                                tracing::debug!(target: "flowstat::jobs", job_id = %id, "job failed");
                                failed.push(resp);
                            }
                            RunStatus::Completed => {
                                tracing::debug!(target: "flowstat::jobs", job_id = %id, "job completed");
                                completed.push(resp);
                            }
                        }
                    }
                    Err(e) => {
                        let failures = query_failures.entry(id.clone()).or_insert(0);
                        *failures += 1;
                        if *failures > self.config.query_retry_limit {
                            tracing::warn!(
                                target: "flowstat::jobs",
                                job_id = %id,
                                error = %e,
                                "status query failed repeatedly, classifying job as failed"
                            );
                            failed.push(JobStatusResponse {
                                job_id: id.clone(),
                                status: RunStatus::Failed,
                                details: Some(format!("status query failed: {e}")),
                            });
                        } else {
                            tracing::debug!(
                                target: "flowstat::jobs",
                                job_id = %id,
                                error = %e,
                                attempt = *failures,
                                "status query failed, keeping job in the running set"
                            );
                            still_running.push(id.clone());
                        }
                    }
                }
            }

            running = still_running;
            if running.is_empty() {
                break;
            }

            if let Some(deadline) = self.config.deadline
                && started.elapsed() >= deadline
            {
                tracing::warn!(
                    target: "flowstat::jobs",
                    outstanding = running.len(),
                    "polling deadline expired with jobs still running"
                );
                return JobsPollingResult {
                    submitted,
                    completed,
                    failed,
                    running_at_deadline: running,
                };
            }

            sleep(delay + jitter(self.config.jitter_ms)).await;
            delay = (delay * 2).min(self.config.max_interval);
        }

        JobsPollingResult {
            submitted,
            completed,
            failed,
            running_at_deadline: Vec::new(),
        }
    }
}

fn jitter(jitter_ms: u64) -> Duration {
    if jitter_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::random::<u64>() % jitter_ms)
}
