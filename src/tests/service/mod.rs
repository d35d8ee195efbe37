use std::sync::Arc;

use mockall::predicate::eq;
use mockall::Sequence;
use rstest::*;
use uuid::Uuid;

use crate::core::client::database::MockRecordRepository;
use crate::core::client::dispatch::{DispatchError, DispatchOutcome, MockRetryDispatcher};
use crate::error::lifecycle::LifecycleError;
use crate::tests::utils::{apply_updates, at, default_record, failed_record, running_record};
use crate::types::record::{DequeueState, ExecutionOutcome, JobStatus, NewExecution};
use crate::worker::service::MonitorService;

fn service(repository: MockRecordRepository, dispatcher: MockRetryDispatcher) -> MonitorService {
    MonitorService::new(Arc::new(repository), Arc::new(dispatcher))
}

fn new_execution(job_id: &str, state: DequeueState) -> NewExecution {
    NewExecution {
        job_uuid: Some(Uuid::new_v4()),
        job_id: job_id.to_string(),
        name: Some(String::from("App.Jobs.SendInvoice")),
        queue: Some(String::from("default")),
        queued_at: Some(at(11, 59, 0)),
        data: None,
        state,
    }
}

/// Tests for `record_dequeued`.
/// The first attempt of a job starts the sequence at 1; a queued record has
/// no start timestamps yet.
#[rstest]
#[tokio::test]
async fn record_dequeued_starts_the_attempt_sequence() {
    let mut repository = MockRecordRepository::new();
    repository.expect_get_latest_record_by_job_id().with(eq("invoice-42")).returning(|_| Ok(None));
    repository
        .expect_create_record()
        .withf(|record| {
            record.attempt == 1
                && record.status == JobStatus::Queued
                && record.started_at.is_none()
                && record.started_at_exact.is_none()
                && !record.retried
        })
        .returning(|mut record| {
            record.id = 7;
            Ok(record)
        });

    let service = service(repository, MockRetryDispatcher::new());
    let record = service.record_dequeued(new_execution("invoice-42", DequeueState::Queued)).await.unwrap();

    assert_eq!(record.id, 7);
    assert_eq!(record.attempt, 1);
}

/// A re-execution continues the attempt sequence of its job_id, and a
/// running dequeue stamps both start timestamps.
#[rstest]
#[tokio::test]
async fn record_dequeued_continues_the_attempt_sequence() {
    let mut previous = failed_record();
    previous.attempt = 2;

    let mut repository = MockRecordRepository::new();
    repository.expect_get_latest_record_by_job_id().with(eq("invoice-42")).returning(move |_| Ok(Some(previous.clone())));
    repository
        .expect_create_record()
        .withf(|record| {
            record.attempt == 3
                && record.status == JobStatus::Running
                && record.started_at.is_some()
                && record.started_at_exact.is_some()
        })
        .returning(|mut record| {
            record.id = 8;
            Ok(record)
        });

    let service = service(repository, MockRetryDispatcher::new());
    let record = service.record_dequeued(new_execution("invoice-42", DequeueState::Running)).await.unwrap();

    assert_eq!(record.attempt, 3);
}

/// Tests for `record_started`.
#[rstest]
#[tokio::test]
async fn record_started_moves_queued_to_running() {
    let queued = default_record();

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().with(eq(1_i64)).returning(move |_| Ok(Some(queued.clone())));
    repository
        .expect_update_record()
        .withf(|_, updates| {
            updates.status == Some(JobStatus::Running) && updates.started_at.is_some() && updates.started_at_exact.is_some()
        })
        .returning(|record, updates| Ok(apply_updates(record, &updates)));

    let service = service(repository, MockRetryDispatcher::new());
    let record = service.record_started(1).await.unwrap();

    assert_eq!(record.status, JobStatus::Running);
    assert!(record.started_at.is_some());
}

#[rstest]
#[tokio::test]
async fn record_started_rejects_non_queued_records() {
    let running = running_record(at(12, 0, 0));

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(running.clone())));

    let service = service(repository, MockRetryDispatcher::new());
    let error = service.record_started(1).await.unwrap_err();

    assert!(matches!(error, LifecycleError::InvalidStatus { id: 1, status: JobStatus::Running }));
}

/// Tests for `record_progress`.
#[rstest]
#[tokio::test]
async fn record_progress_updates_a_running_record() {
    let running = running_record(at(12, 0, 0));

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(running.clone())));
    repository
        .expect_update_record()
        .withf(|_, updates| updates.progress == Some(40))
        .returning(|record, updates| Ok(apply_updates(record, &updates)));

    let service = service(repository, MockRetryDispatcher::new());
    let record = service.record_progress(1, 40).await.unwrap();

    assert_eq!(record.progress, Some(40));
}

/// Progress reports against finished (or never-started) records are
/// rejected without touching the store.
#[rstest]
#[tokio::test]
async fn record_progress_rejects_finished_records() {
    let finished = failed_record();

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(finished.clone())));

    let service = service(repository, MockRetryDispatcher::new());
    let error = service.record_progress(1, 80).await.unwrap_err();

    assert!(matches!(error, LifecycleError::InvalidStatus { .. }));
}

/// Tests for `record_completion`.
#[rstest]
#[tokio::test]
async fn record_completion_marks_success() {
    let running = running_record(at(12, 0, 0));

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(running.clone())));
    repository
        .expect_update_record()
        .withf(|_, updates| {
            updates.status == Some(JobStatus::Succeeded)
                && updates.finished_at.is_some()
                && updates.finished_at_exact.is_some()
                && updates.exception_class.is_none()
        })
        .returning(|record, updates| Ok(apply_updates(record, &updates)));

    let service = service(repository, MockRetryDispatcher::new());
    let record = service.record_completion(1, ExecutionOutcome::Succeeded).await.unwrap();

    assert!(record.has_succeeded());
}

/// A failed completion captures the exception trio alongside the terminal
/// status and end timestamps.
#[rstest]
#[tokio::test]
async fn record_completion_captures_the_failure() {
    let running = running_record(at(12, 0, 0));

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(running.clone())));
    repository
        .expect_update_record()
        .withf(|_, updates| {
            updates.status == Some(JobStatus::Failed)
                && updates.exception_class.as_deref() == Some("App.Exceptions.Timeout")
                && updates.exception_message.as_deref() == Some("took too long")
                && updates.exception.is_some()
        })
        .returning(|record, updates| Ok(apply_updates(record, &updates)));

    let service = service(repository, MockRetryDispatcher::new());
    let outcome = ExecutionOutcome::Failed {
        class: String::from("App.Exceptions.Timeout"),
        message: Some(String::from("took too long")),
        trace: Some(String::from("App.Exceptions.Timeout: took too long")),
    };
    let record = service.record_completion(1, outcome).await.unwrap();

    assert!(record.has_failed());
    assert!(record.captured_exception().is_some());
}

#[rstest]
#[tokio::test]
async fn record_completion_rejects_finished_records() {
    let finished = failed_record();

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(finished.clone())));

    let service = service(repository, MockRetryDispatcher::new());
    let error = service.record_completion(1, ExecutionOutcome::Succeeded).await.unwrap_err();

    assert!(matches!(error, LifecycleError::InvalidStatus { .. }));
}

/// Tests for `retry`.
/// The retried flag is persisted before the dispatch goes out.
#[rstest]
#[tokio::test]
async fn retry_persists_the_flag_then_dispatches() {
    let record = failed_record();
    let job_uuid = record.job_uuid.unwrap();
    let mut sequence = Sequence::new();

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(record.clone())));
    repository
        .expect_update_record()
        .withf(|_, updates| updates.retried == Some(true))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|record, updates| Ok(apply_updates(record, &updates)));

    let mut dispatcher = MockRetryDispatcher::new();
    dispatcher
        .expect_redispatch()
        .with(eq(job_uuid))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(DispatchOutcome { success: true, output: String::from("queued") }));

    let service = service(repository, dispatcher);
    let retried = service.retry(1).await.unwrap();

    assert!(retried.retried);
    assert!(!retried.can_be_retried());
}

/// A dispatch that reports failure propagates the diagnostic output; the
/// persisted flag is not rolled back, so eligibility stays spent.
#[rstest]
#[tokio::test]
async fn retry_dispatch_failure_keeps_the_flag_set() {
    let record = failed_record();
    let job_uuid = record.job_uuid.unwrap();

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(record.clone())));
    repository
        .expect_update_record()
        .withf(|_, updates| updates.retried == Some(true))
        .times(1)
        .returning(|record, updates| Ok(apply_updates(record, &updates)));

    let mut dispatcher = MockRetryDispatcher::new();
    dispatcher
        .expect_redispatch()
        .returning(|_| Ok(DispatchOutcome { success: false, output: String::from("exit status 1") }));

    let service = service(repository, dispatcher);
    let error = service.retry(1).await.unwrap_err();

    assert!(matches!(
        error,
        LifecycleError::RetryDispatchFailed { job_uuid: failed_uuid, ref output }
            if failed_uuid == job_uuid && output == "exit status 1"
    ));
}

/// An unreachable dispatch mechanism maps to the same error, flag spent.
#[rstest]
#[tokio::test]
async fn retry_dispatch_transport_error_keeps_the_flag_set() {
    let record = failed_record();

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(record.clone())));
    repository.expect_update_record().times(1).returning(|record, updates| Ok(apply_updates(record, &updates)));

    let mut dispatcher = MockRetryDispatcher::new();
    dispatcher.expect_redispatch().returning(|_| Err(DispatchError::Unreachable(String::from("socket closed"))));

    let service = service(repository, dispatcher);
    let error = service.retry(1).await.unwrap_err();

    assert!(matches!(error, LifecycleError::RetryDispatchFailed { .. }));
}

/// An ineligible record is rejected before any store write or dispatch;
/// mockall panics on any unexpected call, so no expectations means none
/// happened.
#[rstest]
#[tokio::test]
async fn retry_rejects_ineligible_records() {
    let mut already_retried = failed_record();
    already_retried.retried = true;

    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().returning(move |_| Ok(Some(already_retried.clone())));

    let service = service(repository, MockRetryDispatcher::new());
    let error = service.retry(1).await.unwrap_err();

    assert!(matches!(error, LifecycleError::NotRetriable { id: 1 }));
}

/// Tests for `get_record`.
#[rstest]
#[tokio::test]
async fn get_record_reports_missing_records() {
    let mut repository = MockRecordRepository::new();
    repository.expect_get_record_by_id().with(eq(99_i64)).returning(|_| Ok(None));

    let service = service(repository, MockRetryDispatcher::new());
    let error = service.get_record(99).await.unwrap_err();

    assert!(matches!(error, LifecycleError::RecordNotFound { id: 99 }));
}
