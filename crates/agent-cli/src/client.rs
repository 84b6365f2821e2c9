// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin RPC client over the worker's Unix socket. One connection per call,
//! except `execute`, which keeps its connection open for the life of the
//! stream.

use std::path::{Path, PathBuf};

use agent_core::{CoreError, OperationKey, Phase, ProgressEvent};
use agent_wire::{decode, encode, read_message, write_message, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to worker: {0}")]
    Connect(#[source] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("worker rejected the request: {0}")]
    Remote(String),

    #[error("unexpected response: {0:?}")]
    Unexpected(Response),

    #[error("an operation is already active")]
    AlreadyActive,
}

impl ClientError {
    /// Whether this failure means "the worker isn't there right now" as
    /// opposed to a real protocol or application error — used to decide
    /// whether a follow-up `Shutdown` call is worth logging about.
    pub fn is_server_unavailable(&self) -> bool {
        matches!(self, ClientError::Connect(_) | ClientError::Protocol(ProtocolError::ConnectionClosed))
    }

    /// Translate into the shared error taxonomy for the lifecycle policy.
    pub fn into_core_error(self) -> CoreError {
        match self {
            ClientError::Connect(_) | ClientError::Protocol(ProtocolError::ConnectionClosed | ProtocolError::Timeout) => {
                CoreError::Transport(self.to_string())
            }
            ClientError::AlreadyActive => CoreError::Validation(self.to_string()),
            other => CoreError::Operation(other.to_string()),
        }
    }
}

/// A handle to the worker, identified by its socket path and the
/// supervisor-unit name the connection strategies use for polling.
#[derive(Clone)]
pub struct ClientHandle {
    socket_path: PathBuf,
    service_name: String,
}

impl ClientHandle {
    pub fn new(socket_path: PathBuf, service_name: impl Into<String>) -> Self {
        Self { socket_path, service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    async fn connect(&self) -> Result<UnixStream, ClientError> {
        UnixStream::connect(&self.socket_path).await.map_err(ClientError::Connect)
    }

    async fn call(&self, request: &Request) -> Result<Response, ClientError> {
        let mut stream = self.connect().await?;
        write_message(&mut stream, &encode(request)?).await?;
        let payload = read_message(&mut stream).await?;
        Ok(decode(&payload)?)
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.call(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn hello(&self, version: impl Into<String>) -> Result<String, ClientError> {
        match self.call(&Request::Hello { version: version.into() }).await? {
            Response::Hello { version } => Ok(version),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<(bool, u64), ClientError> {
        match self.call(&Request::Status).await? {
            Response::Status { active, uptime_secs } => Ok((active, uptime_secs)),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn set_state(&self, phase: Phase, state: impl Into<String>) -> Result<(), ClientError> {
        self.expect_ok(&Request::SetState { phase, state: state.into() }).await
    }

    pub async fn complete(&self, key: OperationKey) -> Result<(), ClientError> {
        self.expect_ok(&Request::Complete { key }).await
    }

    pub async fn abort(&self) -> Result<(), ClientError> {
        self.expect_ok(&Request::Abort).await
    }

    pub async fn shutdown(&self, exit_code: Option<i32>, completed: bool) -> Result<(), ClientError> {
        self.expect_ok(&Request::Shutdown { exit_code, completed }).await
    }

    pub async fn generate_debug_report(&self, path: PathBuf) -> Result<(), ClientError> {
        self.expect_ok(&Request::GenerateDebugReport { path }).await
    }

    async fn expect_ok(&self, request: &Request) -> Result<(), ClientError> {
        match self.call(request).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Remote(message)),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    /// Open a long-lived `Execute` stream. `phase` absent resumes the whole
    /// plan; present, executes (or rolls back) a single phase.
    pub async fn execute(&self, phase: Option<Phase>) -> Result<ExecuteStream, ClientError> {
        let mut stream = self.connect().await?;
        write_message(&mut stream, &encode(&Request::Execute { phase })?).await?;
        Ok(ExecuteStream { stream })
    }
}

/// Returns `true` if `path` names a socket a worker is plausibly listening
/// on — a cheap local existence check, not a connectivity guarantee.
pub fn socket_exists(path: &Path) -> bool {
    path.exists()
}

pub struct ExecuteStream {
    stream: UnixStream,
}

impl ExecuteStream {
    /// Next progress event. `Ok(None)` means the connection ended without a
    /// terminal event (disconnect or EOF) rather than an error worth
    /// surfacing.
    pub async fn next(&mut self) -> Result<Option<ProgressEvent>, ClientError> {
        let payload = match read_message(&mut self.stream).await {
            Ok(payload) => payload,
            Err(ProtocolError::ConnectionClosed) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match decode::<Response>(&payload)? {
            Response::Progress { event } => Ok(Some(event)),
            Response::AlreadyActive => Err(ClientError::AlreadyActive),
            Response::Error { message } => Err(ClientError::Remote(message)),
            other => Err(ClientError::Unexpected(other)),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
