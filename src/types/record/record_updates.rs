use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::lifecycle::LifecycleError;
use crate::types::record::types::JobStatus;

/// Defining a structure that contains the changes to be made in the record,
/// identity and creation-time fields are not allowed to be changed. Fields
/// left unset are not touched by the update.
#[derive(Serialize, Debug, Default)]
pub struct JobMonitorRecordUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(with = "chrono::serde::ts_seconds_option", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_exact: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds_option", skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at_exact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retried: Option<bool>,
}

/// implements only needed singular changes
impl JobMonitorRecordUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn update_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn update_started_at_exact(mut self, started_at_exact: String) -> Self {
        self.started_at_exact = Some(started_at_exact);
        self
    }

    pub fn update_finished_at(mut self, finished_at: DateTime<Utc>) -> Self {
        self.finished_at = Some(finished_at);
        self
    }

    pub fn update_finished_at_exact(mut self, finished_at_exact: String) -> Self {
        self.finished_at_exact = Some(finished_at_exact);
        self
    }

    pub fn update_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn update_exception(mut self, class: String, message: Option<String>, trace: Option<String>) -> Self {
        self.exception_class = Some(class);
        self.exception_message = message;
        self.exception = trace;
        self
    }

    pub fn update_retried(mut self, retried: bool) -> Self {
        self.retried = Some(retried);
        self
    }

    pub fn build(self) -> Result<Self, LifecycleError> {
        if self.status.is_none()
            && self.started_at.is_none()
            && self.started_at_exact.is_none()
            && self.finished_at.is_none()
            && self.finished_at_exact.is_none()
            && self.progress.is_none()
            && self.exception_class.is_none()
            && self.retried.is_none()
        {
            Err(LifecycleError::Other("No field to be updated, likely a false call".to_string().into()))
        } else {
            Ok(self)
        }
    }
}
