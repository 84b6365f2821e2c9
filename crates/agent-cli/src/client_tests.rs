// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use agent_wire::{decode, encode, read_message, write_message};
use tokio::net::UnixListener;

use super::*;

/// Spins up a one-shot fake worker that replies with `response` to whatever
/// it receives, then returns a handle pointed at its socket.
async fn fake_worker(response: Response) -> (ClientHandle, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket_path = dir.path().join("agentd.sock");
    let listener = UnixListener::bind(&socket_path).expect("bind");

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            if let Ok(payload) = read_message(&mut stream).await {
                let _: Request = decode(&payload).expect("decode request");
                let response_bytes = encode(&response).expect("encode response");
                let _ = write_message(&mut stream, &response_bytes).await;
            }
        }
    });

    (ClientHandle::new(socket_path, "agentd.service".to_string()), dir)
}

#[tokio::test]
async fn ping_succeeds_on_pong() {
    let (client, _dir) = fake_worker(Response::Pong).await;
    client.ping().await.expect("ping");
}

#[tokio::test]
async fn ping_fails_on_unexpected_response() {
    let (client, _dir) = fake_worker(Response::Ok).await;
    let err = client.ping().await.expect_err("should reject Ok for Ping");
    assert!(matches!(err, ClientError::Unexpected(Response::Ok)));
}

#[tokio::test]
async fn set_state_surfaces_a_remote_error() {
    let (client, _dir) = fake_worker(Response::Error { message: "bad phase".to_string() }).await;
    let key = agent_core::OperationKey::new("acct", "cluster", "op-1");
    let phase = agent_core::Phase { key, id: "etcd".to_string(), force: false, rollback: false };

    let err = client.set_state(phase, "skipped").await.expect_err("should surface remote error");
    assert!(matches!(err, ClientError::Remote(message) if message == "bad phase"));
}

#[tokio::test]
async fn connect_failure_is_reported_as_server_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let client = ClientHandle::new(dir.path().join("missing.sock"), "agentd.service".to_string());

    let err = client.ping().await.expect_err("should fail to connect");
    assert!(err.is_server_unavailable());
}

#[tokio::test]
async fn execute_stream_surfaces_already_active() {
    let (client, _dir) = fake_worker(Response::AlreadyActive).await;
    let mut stream = client.execute(None).await.expect("execute");
    let err = stream.next().await.expect_err("should surface AlreadyActive");
    assert!(matches!(err, ClientError::AlreadyActive));
}
