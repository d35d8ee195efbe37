pub mod constant;
pub mod error;
pub mod mongodb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::record::{JobMonitorRecord, JobMonitorRecordUpdates, JobStatus};
pub use error::DatabaseError;
pub use self::mongodb::MongoDbClient;

/// Trait defining the storage operations the monitor core relies on.
///
/// Single-record writes assume last-writer-wins semantics: one execution
/// attempt owns exactly one record and has a single writer, so no version
/// field or optimistic locking is modeled here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// create_record - Persist a new record, assigning its storage identity.
    /// Fails with `ItemAlreadyExists` when the (job_id, attempt) pair is taken.
    async fn create_record(&self, record: JobMonitorRecord) -> Result<JobMonitorRecord, DatabaseError>;

    /// get_record_by_id - Get a record by its storage identity
    async fn get_record_by_id(&self, id: i64) -> Result<Option<JobMonitorRecord>, DatabaseError>;

    /// get_record_by_job_uuid - Get a record by its execution handle
    async fn get_record_by_job_uuid(&self, job_uuid: uuid::Uuid) -> Result<Option<JobMonitorRecord>, DatabaseError>;

    /// update_record - Apply a partial update and return the stored record
    async fn update_record(
        &self,
        current: &JobMonitorRecord,
        update: JobMonitorRecordUpdates,
    ) -> Result<JobMonitorRecord, DatabaseError>;

    /// get_records_by_job_id - All attempts of a logical job, most recently
    /// started first
    async fn get_records_by_job_id(&self, job_id: &str) -> Result<Vec<JobMonitorRecord>, DatabaseError>;

    /// get_latest_record_by_job_id - The highest attempt of a logical job
    async fn get_latest_record_by_job_id(&self, job_id: &str) -> Result<Option<JobMonitorRecord>, DatabaseError>;

    /// get_records_by_status - All records in a lifecycle state
    async fn get_records_by_status(&self, status: JobStatus) -> Result<Vec<JobMonitorRecord>, DatabaseError>;

    /// get_records_started_since - Records whose execution began at or after
    /// `since`, most recently started first (the last-hour/today dashboards)
    async fn get_records_started_since(&self, since: DateTime<Utc>) -> Result<Vec<JobMonitorRecord>, DatabaseError>;
}
