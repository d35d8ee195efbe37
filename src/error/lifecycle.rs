use crate::core::client::database::DatabaseError;
use crate::error::other::OtherError;
use crate::types::record::types::JobStatus;
use thiserror::Error;
use uuid::Uuid;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Error types for the state-changing operations on monitor records.
///
/// These propagate explicitly: every variant corresponds to an external side
/// effect or a rejected transition the caller must know about.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Indicates the requested record could not be found
    #[error("Failed to find record with id {id}")]
    RecordNotFound { id: i64 },

    /// Indicates the record is in an invalid status for the requested operation
    #[error("Invalid status {status} for record with id {id}. Cannot process.")]
    InvalidStatus { id: i64, status: JobStatus },

    /// Indicates the record does not satisfy the retry-eligibility policy
    /// (already retried, not failed, or missing its execution handle)
    #[error("Record with id {id} is not eligible for retry")]
    NotRetriable { id: i64 },

    /// The external retry operation reported failure. The retried flag is
    /// already persisted and stays set: the underlying side effect may be
    /// partially applied, so the record keeps marking an attempted retry.
    #[error("Retry dispatch for job {job_uuid} failed: {output}")]
    RetryDispatchFailed { job_uuid: Uuid, output: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Wraps general errors that don't fit other categories
    #[error("Other error: {0}")]
    Other(#[from] OtherError),
}
