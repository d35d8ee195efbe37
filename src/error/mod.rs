pub mod lifecycle;
pub mod other;
pub mod record;

use crate::core::client::database::DatabaseError;
use crate::core::client::dispatch::DispatchError;
use thiserror::Error;

pub use lifecycle::{LifecycleError, LifecycleResult};
pub use other::OtherError;
pub use record::RecordError;

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Error types for the monitor core
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("Lifecycle error: {0}")]
    LifecycleError(#[from] LifecycleError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Dispatch error: {0}")]
    DispatchError(#[from] DispatchError),

    #[error(transparent)]
    Other(#[from] OtherError),
}
