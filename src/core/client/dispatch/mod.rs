pub mod error;

use async_trait::async_trait;
use uuid::Uuid;

pub use error::DispatchError;

/// What the external retry operation reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    /// Diagnostic text from the operation, carried into the error when the
    /// dispatch fails
    pub output: String,
}

/// Trait defining the external operation that re-enqueues a previously
/// failed job for another execution attempt. The monitor core only records
/// that a retry was triggered; the dispatch itself belongs to the queue
/// runtime behind this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RetryDispatcher: Send + Sync {
    /// redispatch - Re-enqueue the job identified by `job_uuid`
    async fn redispatch(&self, job_uuid: Uuid) -> Result<DispatchOutcome, DispatchError>;
}
