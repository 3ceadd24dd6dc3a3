mod cli;

use std::collections::HashMap;
use std::sync::Mutex;

use clap::Parser;
use cli::{Cli, Command};
use flowstat::batch::{BatchStatusTracker, IndexingStatus, OperationType, RecordInfo, TracingTelemetry};
use flowstat::jobs::{
    JobClientError, JobId, JobPoller, JobService, JobSpec, JobStatusResponse, RunStatus,
};
use flowstat::workflow::{InMemoryDocumentStore, WorkflowStatusStore, WorkflowStatusType};
use flowstat::{FlowstatConfig, FlowstatError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = FlowstatConfig::load()?;

    match cli.command {
        Command::Demo { jobs } => run_demo(jobs, &config).await?,
        Command::Config => println!("{config:#?}"),
    }

    Ok(())
}

async fn run_demo(jobs: usize, config: &FlowstatConfig) -> Result<(), FlowstatError> {
    demo_batch();
    demo_jobs(jobs, config).await?;
    demo_workflow(&config.workflow_collection).await?;
    Ok(())
}

/// Walks one indexing batch from announcement to finalization.
fn demo_batch() {
    let mut tracker = BatchStatusTracker::new(TracingTelemetry);
    tracker.initialize(&[
        RecordInfo {
            id: "rec-1".to_string(),
            kind: "demo:well:1.0.0".to_string(),
            op: OperationType::Create,
        },
        RecordInfo {
            id: "rec-2".to_string(),
            kind: "demo:well:1.0.0".to_string(),
            op: OperationType::Update,
        },
        RecordInfo {
            id: "rec-3".to_string(),
            kind: "demo:log:1.0.0".to_string(),
            op: OperationType::Create,
        },
    ]);

    tracker.add_or_update("rec-1", IndexingStatus::Success, 200, Some("indexed"));
    tracker.add_or_update("rec-2", IndexingStatus::Warn, 200, Some("schema mismatch, coerced"));
    tracker.add_or_update("rec-2", IndexingStatus::Success, 200, Some("re-indexed"));
    // rec-3 never reports back; finalize sweeps it to FAIL.
    tracker.finalize("batch interrupted before completion");

    tracing::info!(
        total = tracker.len(),
        failed = tracker.ids_with_status(IndexingStatus::Fail).len(),
        warned = tracker.ids_with_status(IndexingStatus::Warn).len(),
        "batch demo finished"
    );
}

async fn demo_jobs(jobs: usize, config: &FlowstatConfig) -> Result<(), FlowstatError> {
    let poller = JobPoller::new(DemoJobService::new(), config.poll_config());

    let specs: Vec<JobSpec> = (0..jobs)
        .map(|i| JobSpec {
            name: format!("demo-job-{i}"),
            context: serde_json::json!({ "index": i }),
        })
        .collect();

    let ids = poller.submit_all(&specs).await?;
    tracing::info!(count = ids.len(), "submitted demo jobs");

    let result = poller.await_completion(&ids).await;
    tracing::info!(
        completed = result.completed.len(),
        failed = result.failed.len(),
        drained = result.fully_drained(),
        "polling demo finished"
    );
    Ok(())
}

async fn demo_workflow(collection: &str) -> Result<(), FlowstatError> {
    let store = WorkflowStatusStore::with_collection(InMemoryDocumentStore::new(), collection);

    let record = store.create("demo-workflow", "run-0001", Some("demo-user")).await?;
    tracing::info!(workflow_id = %record.workflow_id, status = %record.status, "workflow created");

    store.update("demo-workflow", WorkflowStatusType::Running).await?;
    let record = store.update("demo-workflow", WorkflowStatusType::Finished).await?;
    tracing::info!(workflow_id = %record.workflow_id, status = %record.status, "workflow finished");

    // Terminal records accept no further updates.
    if let Err(err) = store.update("demo-workflow", WorkflowStatusType::Running).await {
        tracing::info!(%err, "update after completion rejected");
    }
    Ok(())
}

/// Job service stub for the demo: every job runs for two polling rounds,
/// then every third job fails and the rest complete.
struct DemoJobService {
    polls: Mutex<HashMap<String, u32>>,
    submitted: Mutex<u64>,
}

impl DemoJobService {
    fn new() -> Self {
        Self {
            polls: Mutex::new(HashMap::new()),
            submitted: Mutex::new(0),
        }
    }
}

impl JobService for DemoJobService {
    async fn submit(&self, spec: &JobSpec) -> Result<JobId, JobClientError> {
        let mut counter = self.submitted.lock().unwrap_or_else(|e| e.into_inner());
        *counter += 1;
        Ok(JobId(format!("{}-{}", spec.name, counter)))
    }

    async fn get_status(&self, id: &JobId) -> Result<JobStatusResponse, JobClientError> {
        let mut polls = self.polls.lock().unwrap_or_else(|e| e.into_inner());
        let seen = polls.entry(id.0.clone()).or_insert(0);
        *seen += 1;

        let status = if *seen < 2 {
            RunStatus::Running
        } else if id.0.ends_with("-3") || id.0.ends_with("-6") {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };

        Ok(JobStatusResponse {
            job_id: id.clone(),
            status,
            details: matches!(status, RunStatus::Failed)
                .then(|| "demo-induced failure".to_string()),
        })
    }
}
