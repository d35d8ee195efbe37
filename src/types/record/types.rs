use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, PartialOrd, strum_macros::Display, strum_macros::EnumIter, Eq)]
pub enum JobStatus {
    /// The job has been enqueued and is waiting for a worker to pick it up
    Queued,
    /// A worker has dequeued the job and execution is in flight
    Running,
    /// The job finished and no failure was recorded
    Succeeded,
    /// The job finished with a captured failure
    Failed,
}

/// Whether the runner is creating the record before or after execution
/// actually began. A record created `Running` gets its start timestamps
/// stamped immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueState {
    Queued,
    Running,
}

/// Terminal outcome reported by the job runner at completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    /// The captured failure, decoupled from any live error object so the
    /// record stays inspectable after the failing process exits.
    Failed {
        class: String,
        message: Option<String>,
        trace: Option<String>,
    },
}

/// Everything the job runner knows about an execution attempt at dequeue
/// time. The monitor core assigns the storage identity and the attempt
/// number itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExecution {
    /// Opaque execution handle minted by the queue runtime, used by retry
    /// dispatch. Absent for runners that predate retry support.
    pub job_uuid: Option<Uuid>,
    /// Logical job identifier, shared by all attempts of the same job
    pub job_id: String,
    /// Fully-qualified job type name, ex: App.Jobs.SendInvoice
    pub name: Option<String>,
    /// Queue/channel the job ran on
    pub queue: Option<String>,
    /// When the job was enqueued
    pub queued_at: Option<DateTime<Utc>>,
    /// Job-supplied payload, serialized as a JSON map
    pub data: Option<String>,
    pub state: DequeueState,
}
