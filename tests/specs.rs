// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level black-box specs: drives a real `agent-worker::Server`
//! through `agent-cli`'s client runtime and lifecycle policy, covering the
//! end-to-end scenarios the component design calls out. No supervisor unit
//! is installed in this context, so `AutomaticPolicy` runs with
//! `supervisor: None` — the same "nothing to poll" case a test or an
//! `Observer` attach hits.

use std::sync::Arc;
use std::time::Duration;

use agent_cli::client::ClientHandle;
use agent_cli::interrupt::InterruptHandler;
use agent_cli::lifecycle::{AutomaticPolicy, LifecyclePolicy};
use agent_cli::runtime::{ClientRuntime, StdoutPrinter};
use agent_core::{CoreError, Status};
use agent_worker::{FakeExecutor, Server};
use tokio::net::UnixListener;

/// Binds a fresh socket, spawns the accept loop, and hands back a client
/// handle pointed at it plus the server (so a test can call `abort`/inspect
/// `exit_code`) and the tempdir keeping the socket alive.
async fn spawn_worker(executor: FakeExecutor) -> (ClientHandle, Arc<Server<FakeExecutor>>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("agentd.sock");
    let listener = UnixListener::bind(&socket_path).expect("bind");

    let server = Arc::new(Server::new(Arc::new(executor), Duration::from_secs(5)));
    tokio::spawn(Arc::clone(&server).run(listener));

    let client = ClientHandle::new(socket_path, "agentd-test.service".to_string());
    (client, server, dir)
}

fn noop_supervisor_policy() -> LifecyclePolicy {
    LifecyclePolicy::Automatic(AutomaticPolicy::default())
}

#[tokio::test]
async fn happy_path_completes_and_shuts_the_worker_down() {
    let executor = FakeExecutor::new(vec!["validating host", "provisioning", "finalizing"], Ok(Status::Completed));
    let (client, server, _dir) = spawn_worker(executor).await;

    let (handler, handle) = InterruptHandler::spawn(Duration::from_secs(1));
    let runtime = ClientRuntime::new(client.clone(), Arc::new(StdoutPrinter));
    let (status, err) = runtime.run(&handle).await;
    drop(handler);

    assert_eq!(status, Status::Completed);
    assert!(err.is_none());

    let result = noop_supervisor_policy().handle_status(&client, status, err).await;
    assert!(result.is_ok());

    // Shutdown fired with the completed sentinel; the accept loop stops.
    server.notified().await;
    assert_eq!(server.exit_code(), Some(agent_core::EXIT_COMPLETED));
}

#[tokio::test]
async fn abort_mid_run_surfaces_as_cancellation() {
    let executor = FakeExecutor::new(vec!["step one", "step two", "step three", "step four"], Ok(Status::Completed));
    let (client, server, _dir) = spawn_worker(executor).await;

    let (handler, handle) = InterruptHandler::spawn(Duration::from_secs(1));
    let runtime = ClientRuntime::new(client.clone(), Arc::new(StdoutPrinter));

    let run = tokio::spawn(async move { runtime.run(&handle).await });
    tokio::time::sleep(Duration::from_millis(25)).await;
    client.abort().await.expect("abort request");

    let (status, err) = run.await.expect("runtime task");
    drop(handler);

    assert_eq!(status, Status::Aborted);
    assert!(err.is_none());

    let result = noop_supervisor_policy().handle_status(&client, status, err).await;
    assert!(matches!(result, Err(CoreError::Cancellation)));
    assert_eq!(server.exit_code(), Some(agent_core::EXIT_ABORTED));
}

#[tokio::test]
async fn failed_precondition_shuts_down_with_the_precondition_code() {
    let executor = FakeExecutor::new(vec![], Err(CoreError::Precondition("insufficient disk space".to_string())));
    let (client, server, _dir) = spawn_worker(executor).await;

    let (handler, handle) = InterruptHandler::spawn(Duration::from_secs(1));
    let runtime = ClientRuntime::new(client.clone(), Arc::new(StdoutPrinter));
    let (status, err) = runtime.run(&handle).await;
    drop(handler);

    // A terminal error event always carries `Status::Unknown` — the
    // precondition tag rides in the error payload, not the status.
    assert_eq!(status, Status::Unknown);
    assert!(matches!(err, Some(CoreError::Precondition(_))));

    let result = noop_supervisor_policy().handle_status(&client, status, err).await;
    assert!(result.is_err());
    server.notified().await;
    assert_eq!(server.exit_code(), Some(agent_core::EXIT_FAILED_PRECONDITION));
}

#[tokio::test]
async fn completed_pending_leaves_the_worker_running_for_a_later_resume() {
    let executor = FakeExecutor::new(vec!["awaiting external signal"], Ok(Status::CompletedPending));
    let (client, server, _dir) = spawn_worker(executor).await;

    let (handler, handle) = InterruptHandler::spawn(Duration::from_secs(1));
    let runtime = ClientRuntime::new(client.clone(), Arc::new(StdoutPrinter));
    let (status, err) = runtime.run(&handle).await;
    drop(handler);

    assert_eq!(status, Status::CompletedPending);
    assert!(err.is_none());

    let result = noop_supervisor_policy().handle_status(&client, status, err).await;
    assert!(result.is_ok());

    // No shutdown was requested; the worker is still answering `Ping`.
    assert!(!server.shutdown_requested());
    client.ping().await.expect("worker still up");

    // The caller later decides the operation is done and completes it
    // explicitly; only now does the worker shut down, with the completed
    // sentinel exit code.
    let policy = noop_supervisor_policy();
    runtime.complete(agent_core::OperationKey::new("acct", "cluster", "op-1"), &policy).await.expect("complete");

    server.notified().await;
    assert_eq!(server.exit_code(), Some(agent_core::EXIT_COMPLETED));
}

#[tokio::test]
async fn disconnect_mid_stream_resumes_from_the_buffered_event_on_reconnect() {
    let executor =
        FakeExecutor::new(vec!["step one", "step two", "step three", "step four"], Ok(Status::Completed));
    let (client, _server, _dir) = spawn_worker(executor).await;

    let mut first = client.execute(None).await.expect("first attach");
    let opening = first.next().await.expect("first event").expect("some event");
    assert_eq!(opening.message, "step one");
    drop(first);

    // The executor keeps running in the background; give it a moment to
    // queue events into the bus while nothing is attached to read them.
    tokio::time::sleep(Duration::from_millis(60)).await;

    let mut second = client.execute(None).await.expect("reattach");
    let mut messages = Vec::new();
    let mut final_status = None;
    while let Some(event) = second.next().await.expect("resumed event") {
        let terminal = event.is_terminal();
        messages.push(event.message);
        if terminal {
            final_status = Some(event.status);
            break;
        }
    }

    // Nothing queued between the two attaches was dropped: every later step
    // shows up, in order, ending in the terminal event.
    assert_eq!(messages, vec!["step two", "step three", "step four", "operation completed"]);
    assert_eq!(final_status, Some(Status::Completed));
}

#[tokio::test]
async fn resuming_against_a_worker_that_is_not_running_reports_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("agentd.sock");
    let client = ClientHandle::new(socket_path, "agentd-test.service".to_string());

    let err = client.ping().await.expect_err("nothing is listening");
    assert!(err.is_server_unavailable());
}
