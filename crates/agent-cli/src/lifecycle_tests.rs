// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use agent_wire::{decode, encode, read_message, write_message, Request, Response};
use tokio::net::UnixListener;

use super::*;
use crate::client::ClientHandle;

/// Records every request it receives and always answers `Ok`, except
/// `GenerateDebugReport`, which answers per `report_response`.
async fn recording_worker(report_response: Response) -> (ClientHandle, Arc<Mutex<Vec<Request>>>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("agentd.sock");
    let listener = UnixListener::bind(&socket_path).expect("bind");
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_task = Arc::clone(&received);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { return };
            let Ok(payload) = read_message(&mut stream).await else { continue };
            let request: Request = decode(&payload).expect("decode");
            let response = match &request {
                Request::GenerateDebugReport { .. } => report_response.clone(),
                _ => Response::Ok,
            };
            received_task.lock().expect("lock").push(request);
            let _ = write_message(&mut stream, &encode(&response).expect("encode")).await;
        }
    });

    (ClientHandle::new(socket_path, "agentd.service".to_string()), received, dir)
}

#[derive(Default)]
struct RecordingCompleter {
    calls: AtomicU32,
}

#[async_trait]
impl Completer for RecordingCompleter {
    async fn complete(&self, _status: Status) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingAborter {
    calls: AtomicU32,
}

#[async_trait]
impl Aborter for RecordingAborter {
    async fn abort(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingReporter {
    calls: AtomicU32,
}

#[async_trait]
impl DebugReporter for RecordingReporter {
    async fn report(&self, _error: &CoreError) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn policy(
    debug_report_path: Option<std::path::PathBuf>,
    completer: Option<Arc<dyn Completer>>,
    aborter: Option<Arc<dyn Aborter>>,
    local_debug_reporter: Option<Arc<dyn DebugReporter>>,
) -> LifecyclePolicy {
    LifecyclePolicy::Automatic(AutomaticPolicy {
        debug_report_path,
        completer,
        aborter,
        local_debug_reporter,
        ..AutomaticPolicy::default()
    })
}

#[tokio::test]
async fn completed_status_shuts_down_and_notifies_the_completer() {
    let (client, received, _dir) = recording_worker(Response::Ok).await;
    let completer = Arc::new(RecordingCompleter::default());
    let policy = policy(None, Some(Arc::clone(&completer) as Arc<dyn Completer>), None, None);

    let result = policy.handle_status(&client, Status::Completed, None).await;
    assert!(result.is_ok());
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);

    let requests = received.lock().expect("lock");
    assert!(matches!(requests.last(), Some(Request::Shutdown { completed: true, .. })));
}

#[tokio::test]
async fn completed_pending_leaves_the_worker_running() {
    let (client, received, _dir) = recording_worker(Response::Ok).await;
    let completer = Arc::new(RecordingCompleter::default());
    let policy = policy(None, Some(Arc::clone(&completer) as Arc<dyn Completer>), None, None);

    let result = policy.handle_status(&client, Status::CompletedPending, None).await;
    assert!(result.is_ok());
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);
    assert!(received.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn aborted_status_invokes_the_aborter_and_returns_cancellation() {
    let (client, _received, _dir) = recording_worker(Response::Ok).await;
    let aborter = Arc::new(RecordingAborter::default());
    let policy = policy(None, None, Some(Arc::clone(&aborter) as Arc<dyn Aborter>), None);

    let result = policy.handle_status(&client, Status::Aborted, None).await;
    assert!(matches!(result, Err(CoreError::Cancellation)));
    assert_eq!(aborter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generic_error_reports_locally_when_no_debug_report_path_is_set() {
    let (client, received, _dir) = recording_worker(Response::Ok).await;
    let reporter = Arc::new(RecordingReporter::default());
    let policy = policy(None, None, None, Some(Arc::clone(&reporter) as Arc<dyn DebugReporter>));

    let err = policy.handle_status(&client, Status::Unknown, Some(CoreError::Operation("boom".into()))).await;
    assert!(matches!(err, Err(CoreError::Operation(_))));
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);

    let requests = received.lock().expect("lock");
    assert!(matches!(requests.last(), Some(Request::Shutdown { exit_code: None, completed: false })));
}

#[tokio::test]
async fn precondition_error_shuts_down_with_the_failed_precondition_code() {
    let (client, received, _dir) = recording_worker(Response::Ok).await;
    let policy = policy(None, None, None, None);

    let err = policy.handle_status(&client, Status::Unknown, Some(CoreError::Precondition("no disk".into()))).await;
    assert!(matches!(err, Err(CoreError::Precondition(_))));

    let requests = received.lock().expect("lock");
    assert!(matches!(
        requests.last(),
        Some(Request::Shutdown { exit_code: Some(code), .. }) if *code == agent_core::EXIT_FAILED_PRECONDITION
    ));
}

#[tokio::test]
async fn debug_report_written_on_the_worker_skips_the_local_reporter() {
    let (client, _received, _dir) = recording_worker(Response::Ok).await;
    let reporter = Arc::new(RecordingReporter::default());
    let policy = policy(
        Some(std::path::PathBuf::from("/tmp/report.tar.gz")),
        None,
        None,
        Some(Arc::clone(&reporter) as Arc<dyn DebugReporter>),
    );

    let _ = policy.handle_status(&client, Status::Unknown, Some(CoreError::Operation("boom".into()))).await;
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn completed_status_waits_for_the_unit_to_go_inactive() {
    use agent_supervisor::FakeSupervisorAdapter;

    let (client, _received, _dir) = recording_worker(Response::Ok).await;
    let supervisor = Arc::new(FakeSupervisorAdapter::new());
    supervisor.install(&agent_supervisor::UnitSpec::new("agentd.service", vec!["agentd".to_string()])).await.expect("install");
    supervisor.start("agentd.service", agent_supervisor::StartMode::NonBlocking).await.expect("start");

    let supervisor_for_task = Arc::clone(&supervisor);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        supervisor_for_task.stop("agentd.service").await.expect("stop");
    });

    let policy = LifecyclePolicy::Automatic(AutomaticPolicy {
        supervisor: Some(supervisor.clone() as Arc<dyn SupervisorAdapter>),
        service_name: Some("agentd.service".to_string()),
        shutdown_wait_timeout: std::time::Duration::from_secs(2),
        ..AutomaticPolicy::default()
    });

    let result = policy.handle_status(&client, Status::Completed, None).await;
    assert!(result.is_ok());
    assert!(!supervisor.is_active("agentd.service").await.expect("is_active"));
}

#[tokio::test]
async fn complete_shuts_down_with_the_completed_sentinel_and_notifies_the_completer() {
    let (client, received, _dir) = recording_worker(Response::Ok).await;
    let completer = Arc::new(RecordingCompleter::default());
    let policy = policy(None, Some(Arc::clone(&completer) as Arc<dyn Completer>), None, None);

    let result = policy.complete(&client).await;
    assert!(result.is_ok());
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);

    let requests = received.lock().expect("lock");
    assert!(matches!(
        requests.last(),
        Some(Request::Shutdown { exit_code: Some(code), completed: true }) if *code == agent_core::EXIT_COMPLETED
    ));
}

#[tokio::test]
async fn noop_policy_complete_is_a_no_op() {
    let (client, received, _dir) = recording_worker(Response::Ok).await;
    let policy = LifecyclePolicy::Noop(NoopPolicy);

    assert!(policy.complete(&client).await.is_ok());
    assert!(received.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn noop_policy_surfaces_errors_and_ignores_a_clean_finish() {
    let (client, _received, _dir) = recording_worker(Response::Ok).await;
    let policy = LifecyclePolicy::Noop(NoopPolicy);

    assert!(policy.handle_status(&client, Status::Completed, None).await.is_ok());
    let err = policy.handle_status(&client, Status::Unknown, Some(CoreError::Operation("boom".into()))).await;
    assert!(matches!(err, Err(CoreError::Operation(_))));
}
