use std::collections::HashMap;
use std::error::Error;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::record::RecordError;
use crate::types::record::exception::{CapturedException, ExceptionRegistry};
use crate::types::record::types::JobStatus;

/// One execution attempt of one background job.
///
/// The job runner is the sole writer of the execution fields; downstream
/// observers are read-only except for the `retried` flag, set through the
/// retry operation. The record never initiates I/O itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JobMonitorRecord {
    /// storage-assigned identity
    pub id: i64,
    /// opaque execution handle minted by the queue runtime, used by retry dispatch
    pub job_uuid: Option<Uuid>,
    /// logical job identifier, shared by all attempts of the same job
    pub job_id: String,
    /// fully-qualified job type name, ex: App.Jobs.SendInvoice
    pub name: Option<String>,
    /// queue/channel the job ran on
    pub queue: Option<String>,
    /// when the job was enqueued
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub queued_at: Option<DateTime<Utc>>,
    /// when execution began, truncated to second precision on the wire
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    /// high-precision start instant, serialized; preferred over `started_at`
    pub started_at_exact: Option<String>,
    /// when execution ended, truncated to second precision on the wire
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub finished_at: Option<DateTime<Utc>>,
    /// high-precision end instant, serialized; preferred over `finished_at`
    pub finished_at_exact: Option<String>,
    /// current lifecycle state
    pub status: JobStatus,
    /// attempt number for this job_id, monotonically non-decreasing across re-executions
    pub attempt: u16,
    /// self-reported 0-100 completion percentage
    pub progress: Option<u8>,
    /// fully-qualified type name of a captured failure
    pub exception_class: Option<String>,
    /// captured failure message
    pub exception_message: Option<String>,
    /// full captured trace
    pub exception: Option<String>,
    /// job-supplied payload, serialized as a JSON map
    pub data: Option<String>,
    /// true once a retry has been triggered for this record
    pub retried: bool,
}

impl JobMonitorRecord {
    /// True iff the record is terminal: failed, or carrying an end timestamp.
    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Failed || self.finished_at.is_some()
    }

    pub fn has_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }

    /// Failure is checked first: a finished record that is flagged failed
    /// must never report success, whatever its timestamps say.
    pub fn has_succeeded(&self) -> bool {
        !self.has_failed() && self.is_finished()
    }

    /// The parsed `started_at_exact` instant, or `None` when the field is
    /// absent. A present-but-unparseable value is an error, not a silent miss.
    pub fn exact_started_at(&self) -> Result<Option<DateTime<Utc>>, RecordError> {
        self.started_at_exact.as_deref().map(|value| parse_exact("started_at_exact", value)).transpose()
    }

    /// The parsed `finished_at_exact` instant; same contract as
    /// [`exact_started_at`](Self::exact_started_at).
    pub fn exact_finished_at(&self) -> Result<Option<DateTime<Utc>>, RecordError> {
        self.finished_at_exact.as_deref().map(|value| parse_exact("finished_at_exact", value)).transpose()
    }

    /// How long the attempt has run.
    ///
    /// The end instant is the explicit `end` argument, else the exact finish
    /// timestamp, else the coarse one, else now. The start instant prefers
    /// the exact field over the coarse one, since the coarse fields carry
    /// second-level truncation that distorts short-duration measurements.
    /// A record that never started has a zero elapsed time. A negative delta
    /// is reported as [`RecordError::ClockSkew`] rather than clamped.
    pub fn elapsed(&self, end: Option<DateTime<Utc>>) -> Result<Duration, RecordError> {
        let end = match end {
            Some(end) => end,
            None => match self.exact_finished_at()? {
                Some(exact) => exact,
                None => self.finished_at.unwrap_or_else(Utc::now),
            },
        };

        let start = match self.exact_started_at()? {
            Some(exact) => Some(exact),
            None => self.started_at,
        };
        let Some(start) = start else {
            return Ok(Duration::zero());
        };

        let elapsed = end - start;
        if elapsed < Duration::zero() {
            return Err(RecordError::ClockSkew { start, end });
        }
        Ok(elapsed)
    }

    /// Projected time to completion, linearly extrapolated from the
    /// self-reported progress.
    ///
    /// This assumes constant throughput from `started_at` to `now` and
    /// projects the same rate over the remaining percentage. No smoothing,
    /// no outlier rejection: treat it as a rough ETA, not a guarantee.
    ///
    /// Zero when there is no progress yet, no start timestamp, the attempt
    /// already finished, or `now` equals `started_at` (nothing to
    /// extrapolate from). Out-of-range progress is not clamped; a progress
    /// above 100 yields the raw, negative arithmetic result.
    pub fn remaining(&self, now: Option<DateTime<Utc>>) -> Duration {
        let progress = match self.progress {
            Some(progress) if progress > 0 => progress,
            _ => return Duration::zero(),
        };
        let Some(started_at) = self.started_at else {
            return Duration::zero();
        };
        if self.is_finished() {
            return Duration::zero();
        }

        let now = now.unwrap_or_else(Utc::now);
        let elapsed_ms = (now - started_at).num_milliseconds();
        if elapsed_ms == 0 {
            return Duration::zero();
        }

        let rate = f64::from(progress) / (elapsed_ms as f64 / 1000.0);
        let remaining_secs = (100.0 - f64::from(progress)) / rate;
        Duration::milliseconds((remaining_secs * 1000.0).round() as i64)
    }

    /// The stored failure fields, verbatim. `None` unless a failure was
    /// captured.
    pub fn captured_exception(&self) -> Option<CapturedException> {
        self.exception_class.as_ref().map(|class| CapturedException {
            class: class.clone(),
            message: self.exception_message.clone(),
            trace: self.exception.clone(),
        })
    }

    /// Best-effort reconstruction of the captured failure as a live error
    /// value, looked up by class name in `registry`.
    ///
    /// With `rescue` an unknown class degrades to `Ok(None)`; without it the
    /// miss propagates, for callers that must distinguish "no failure" from
    /// "failure this process cannot materialize".
    pub fn reconstruct_exception(
        &self,
        registry: &ExceptionRegistry,
        rescue: bool,
    ) -> Result<Option<Box<dyn Error + Send + Sync>>, RecordError> {
        let Some(class) = self.exception_class.as_deref() else {
            return Ok(None);
        };
        match registry.instantiate(class, self.exception_message.as_deref()) {
            Some(exception) => Ok(Some(exception)),
            None if rescue => {
                debug!(record_id = self.id, class, "No registered reconstruction for exception class, rescued");
                Ok(None)
            }
            None => Err(RecordError::ExceptionReconstructionFailed { class: class.to_string() }),
        }
    }

    /// Strict decode of the `data` payload as a JSON map.
    pub fn try_decoded_data(&self) -> Result<HashMap<String, Value>, RecordError> {
        match self.data.as_deref() {
            Some(payload) => Ok(serde_json::from_str(payload)?),
            None => Ok(HashMap::new()),
        }
    }

    /// The `data` payload as a key/value map. The payload is optional
    /// diagnostic context, so an absent or undecodable payload degrades to an
    /// empty map instead of an error.
    pub fn decoded_data(&self) -> HashMap<String, Value> {
        self.try_decoded_data().unwrap_or_else(|error| {
            debug!(record_id = self.id, error = %error, "Ignoring undecodable data payload");
            HashMap::new()
        })
    }

    /// The bare type name of the job, without its namespace prefix.
    pub fn basename(&self) -> Option<&str> {
        self.name.as_deref().and_then(|name| name.rsplit(['.', '\\']).next())
    }

    /// Retry-eligibility policy: failed, never retried, and carrying the
    /// execution handle the dispatch needs.
    pub fn can_be_retried(&self) -> bool {
        !self.retried && self.status == JobStatus::Failed && self.job_uuid.is_some()
    }
}

fn parse_exact(field: &'static str, value: &str) -> Result<DateTime<Utc>, RecordError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|source| RecordError::MalformedTimestamp { field, value: value.to_string(), source })
}
