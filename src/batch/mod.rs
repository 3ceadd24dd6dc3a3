mod record;
mod status;
mod tracker;

pub use record::{IndexProgress, RecordInfo, RecordStatus};
pub use status::{IndexingStatus, OperationType, ParseIndexingStatusError, ParseOperationTypeError};
pub use tracker::{BatchStatusTracker, TelemetrySink, TracingTelemetry};
