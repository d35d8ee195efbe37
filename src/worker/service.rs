use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::core::client::database::RecordRepository;
use crate::core::client::dispatch::RetryDispatcher;
use crate::error::lifecycle::{LifecycleError, LifecycleResult};
use crate::types::record::{
    DequeueState, ExecutionOutcome, JobMonitorRecord, JobMonitorRecordUpdates, JobStatus, NewExecution,
};

/// Entry points for the collaborators that drive a record through its
/// lifecycle: the job runner (dequeue, progress, completion) and the retry
/// trigger. Every operation is synchronous from the caller's point of view
/// and persists through the repository before returning.
pub struct MonitorService {
    repository: Arc<dyn RecordRepository>,
    dispatcher: Arc<dyn RetryDispatcher>,
}

impl MonitorService {
    pub fn new(repository: Arc<dyn RecordRepository>, dispatcher: Arc<dyn RetryDispatcher>) -> Self {
        Self { repository, dispatcher }
    }

    /// Retrieves a record by its storage identity
    pub async fn get_record(&self, id: i64) -> LifecycleResult<JobMonitorRecord> {
        self.repository.get_record_by_id(id).await?.ok_or(LifecycleError::RecordNotFound { id })
    }

    /// Looks up the record owning an execution handle, for retry triggers
    /// keyed by job uuid rather than storage identity
    pub async fn record_for_job_uuid(&self, job_uuid: Uuid) -> LifecycleResult<Option<JobMonitorRecord>> {
        Ok(self.repository.get_record_by_job_uuid(job_uuid).await?)
    }

    /// All attempts of a logical job, most recently started first
    pub async fn records_for_job(&self, job_id: &str) -> LifecycleResult<Vec<JobMonitorRecord>> {
        Ok(self.repository.get_records_by_job_id(job_id).await?)
    }

    /// All records in a lifecycle state
    pub async fn records_by_status(&self, status: JobStatus) -> LifecycleResult<Vec<JobMonitorRecord>> {
        Ok(self.repository.get_records_by_status(status).await?)
    }

    /// Records whose execution began at or after `since`
    pub async fn records_started_since(&self, since: DateTime<Utc>) -> LifecycleResult<Vec<JobMonitorRecord>> {
        Ok(self.repository.get_records_started_since(since).await?)
    }

    /// Creates the record for a fresh execution attempt at job dequeue.
    ///
    /// The attempt number continues the sequence of earlier attempts sharing
    /// the same job_id. A record created `Running` gets its start timestamps
    /// stamped here; the coarse field is truncated to whole seconds, the
    /// exact field keeps microsecond precision.
    #[instrument(skip(self, execution), fields(job_id = %execution.job_id))]
    pub async fn record_dequeued(&self, execution: NewExecution) -> LifecycleResult<JobMonitorRecord> {
        let attempt = match self.repository.get_latest_record_by_job_id(&execution.job_id).await? {
            Some(previous) => previous.attempt.saturating_add(1),
            None => 1,
        };

        let now = Utc::now();
        let (status, started_at, started_at_exact) = match execution.state {
            DequeueState::Queued => (JobStatus::Queued, None, None),
            DequeueState::Running => (
                JobStatus::Running,
                Some(now.round_subsecs(0)),
                Some(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
            ),
        };

        let record = JobMonitorRecord {
            id: 0,
            job_uuid: execution.job_uuid,
            job_id: execution.job_id,
            name: execution.name,
            queue: execution.queue,
            queued_at: execution.queued_at.map(|queued_at| queued_at.round_subsecs(0)),
            started_at,
            started_at_exact,
            finished_at: None,
            finished_at_exact: None,
            status,
            attempt,
            progress: None,
            exception_class: None,
            exception_message: None,
            exception: None,
            data: execution.data,
            retried: false,
        };

        let record = self.repository.create_record(record).await?;
        info!(record_id = record.id, attempt = record.attempt, status = %record.status, "Recorded dequeued execution");
        Ok(record)
    }

    /// Marks a queued record as running and stamps its start timestamps
    #[instrument(skip(self), fields(record_id = id))]
    pub async fn record_started(&self, id: i64) -> LifecycleResult<JobMonitorRecord> {
        let record = self.get_record(id).await?;
        if record.status != JobStatus::Queued {
            warn!(status = %record.status, "Cannot start record");
            return Err(LifecycleError::InvalidStatus { id, status: record.status });
        }

        let now = Utc::now();
        let updates = JobMonitorRecordUpdates::new()
            .update_status(JobStatus::Running)
            .update_started_at(now.round_subsecs(0))
            .update_started_at_exact(now.to_rfc3339_opts(SecondsFormat::Micros, true))
            .build()?;

        Ok(self.repository.update_record(&record, updates).await?)
    }

    /// Stores a progress report from the running job. Progress is only
    /// meaningful while the job has started and has not finished.
    #[instrument(skip(self), fields(record_id = id))]
    pub async fn record_progress(&self, id: i64, progress: u8) -> LifecycleResult<JobMonitorRecord> {
        let record = self.get_record(id).await?;
        if record.started_at.is_none() || record.is_finished() {
            warn!(status = %record.status, "Rejecting progress report");
            return Err(LifecycleError::InvalidStatus { id, status: record.status });
        }

        debug!(progress, "Recording progress");
        let updates = JobMonitorRecordUpdates::new().update_progress(progress).build()?;
        Ok(self.repository.update_record(&record, updates).await?)
    }

    /// Finishes the attempt: stamps the end timestamps and the terminal
    /// status, and captures the exception fields on failure. Terminal
    /// records reject further completions.
    #[instrument(skip(self, outcome), fields(record_id = id))]
    pub async fn record_completion(&self, id: i64, outcome: ExecutionOutcome) -> LifecycleResult<JobMonitorRecord> {
        let record = self.get_record(id).await?;
        if record.is_finished() {
            warn!(status = %record.status, "Record already finished");
            return Err(LifecycleError::InvalidStatus { id, status: record.status });
        }

        let now = Utc::now();
        let updates = JobMonitorRecordUpdates::new()
            .update_finished_at(now.round_subsecs(0))
            .update_finished_at_exact(now.to_rfc3339_opts(SecondsFormat::Micros, true));

        let updates = match outcome {
            ExecutionOutcome::Succeeded => updates.update_status(JobStatus::Succeeded),
            ExecutionOutcome::Failed { class, message, trace } => {
                info!(class = %class, "Recording failed execution");
                updates.update_status(JobStatus::Failed).update_exception(class, message, trace)
            }
        };

        let record = self.repository.update_record(&record, updates.build()?).await?;
        info!(status = %record.status, "Recorded completion");
        Ok(record)
    }

    /// Triggers re-execution of a failed job.
    ///
    /// The retried flag is persisted before the dispatch goes out, so a
    /// dispatch failure leaves the record marking an attempted retry and
    /// `can_be_retried` stays false: at most one dispatch attempt per
    /// record, never an automatic second one. There is no atomicity across
    /// the persist and the dispatch; a crash between the two leaves the flag
    /// set with no dispatch sent.
    #[instrument(skip(self), fields(record_id = id))]
    pub async fn retry(&self, id: i64) -> LifecycleResult<JobMonitorRecord> {
        let record = self.get_record(id).await?;
        if !record.can_be_retried() {
            warn!(status = %record.status, retried = record.retried, "Record is not eligible for retry");
            return Err(LifecycleError::NotRetriable { id });
        }
        let Some(job_uuid) = record.job_uuid else {
            return Err(LifecycleError::NotRetriable { id });
        };

        let updates = JobMonitorRecordUpdates::new().update_retried(true).build()?;
        let record = self.repository.update_record(&record, updates).await?;
        info!(%job_uuid, "Marked record for retry");

        let outcome = self
            .dispatcher
            .redispatch(job_uuid)
            .await
            .map_err(|e| LifecycleError::RetryDispatchFailed { job_uuid, output: e.to_string() })?;

        if !outcome.success {
            error!(output = %outcome.output, "Retry dispatch reported failure");
            return Err(LifecycleError::RetryDispatchFailed { job_uuid, output: outcome.output });
        }

        info!("Retry dispatched");
        Ok(record)
    }
}
