pub mod exception;
pub mod record;
pub mod record_updates;
pub mod types;

pub use exception::{CapturedException, ExceptionRegistry, ReconstructedException};
pub use record::JobMonitorRecord;
pub use record_updates::JobMonitorRecordUpdates;
pub use types::{DequeueState, ExecutionOutcome, JobStatus, NewExecution};
