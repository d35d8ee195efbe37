use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error types for the derived computations of a monitor record.
///
/// These cover data-quality conditions on stored fields; the accessors that
/// serve optional diagnostics (`decoded_data`, `basename`) degrade silently
/// instead of returning these.
#[derive(Error, Debug)]
pub enum RecordError {
    /// An exact-timestamp field is present but unparseable
    #[error("Malformed {field} value {value:?}: {source}")]
    MalformedTimestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A duration computation came out negative, indicating clock skew or
    /// corrupt data. Surfaced rather than clamped so monitoring can flag the
    /// record.
    #[error("Negative duration: start {start} is after end {end}")]
    ClockSkew { start: DateTime<Utc>, end: DateTime<Utc> },

    /// The stored exception class has no registered reconstruction
    #[error("No registered reconstruction for exception class {class:?}")]
    ExceptionReconstructionFailed { class: String },

    /// The data payload is not a valid JSON map
    #[error("Failed to decode data payload: {0}")]
    PayloadDecodeFailed(#[from] serde_json::Error),
}
