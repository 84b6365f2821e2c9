// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC server (C4): owns the worker's Unix socket and the single operation
//! it can run at a time, dispatching every connection's first request to
//! either the unary handlers or the reattachable `Execute` stream.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_core::{Phase, ProgressEvent, Status};
use agent_wire::{read_request, write_response, ProtocolError, Request, Response};
use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::event_bus::{EventBus, EventReader};
use crate::executor::Executor;

const NO_EXIT_CODE: i32 = i32::MIN;

/// Shared state for the one `Execute` operation the server can run at a
/// time.
///
/// `executing` spans the whole run, independent of whether a client is
/// currently attached; `attached` tracks only the latter. `pending` holds an
/// event already popped off `reader` but not yet delivered — replayed first
/// on the next attach so a write failure or disconnect never silently drops
/// it. `bus` is kept so `abort` can push a terminal event directly, racing
/// harmlessly with the dispatch task's own eventual one.
struct OperationState {
    executing: bool,
    attached: bool,
    bus: Option<EventBus>,
    reader: Option<EventReader>,
    pending: Option<ProgressEvent>,
    cancel: Option<CancellationToken>,
}

impl Default for OperationState {
    fn default() -> Self {
        Self { executing: false, attached: false, bus: None, reader: None, pending: None, cancel: None }
    }
}

/// The worker's IPC server.
pub struct Server<E> {
    executor: Arc<E>,
    operation: Mutex<OperationState>,
    start_time: Instant,
    ipc_timeout: Duration,
    shutdown: Notify,
    exit_code: AtomicI32,
    shutdown_requested: AtomicBool,
}

impl<E: Executor> Server<E> {
    pub fn new(executor: Arc<E>, ipc_timeout: Duration) -> Self {
        Self {
            executor,
            operation: Mutex::new(OperationState::default()),
            start_time: Instant::now(),
            ipc_timeout,
            shutdown: Notify::new(),
            exit_code: AtomicI32::new(NO_EXIT_CODE),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// The exit code requested through `Shutdown` or `abort`, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self.exit_code.load(Ordering::SeqCst) {
            NO_EXIT_CODE => None,
            code => Some(code),
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Resolves once a `Shutdown` request (or `abort`-driven shutdown) fires.
    pub async fn notified(&self) {
        self.shutdown.notified().await;
    }

    /// Accept connections until shutdown fires. Each connection is handled
    /// on its own task so a slow or hung client never blocks new ones.
    pub async fn run(self: Arc<Self>, listener: UnixListener) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    info!("server accept loop stopping");
                    return;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let server = Arc::clone(&self);
                            tokio::spawn(async move { server.handle_connection(stream).await });
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
            }
        }
    }

    async fn handle_connection(self: Arc<Self>, mut stream: UnixStream) {
        let request = match read_request(&mut stream, self.ipc_timeout).await {
            Ok(r) => r,
            Err(e) => return log_connection_error(&e),
        };

        if matches!(request, Request::Execute { .. }) {
            self.handle_execute(stream, request).await;
            return;
        }

        let response = self.handle_unary(request).await;
        if let Err(e) = write_response(&mut stream, &response, self.ipc_timeout).await {
            log_connection_error(&e);
        }
    }

    async fn handle_unary(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,
            Request::Hello { .. } => Response::Hello { version: crate::env::PROTOCOL_VERSION.to_string() },
            Request::Status => {
                let op = self.operation.lock();
                Response::Status { active: op.executing, uptime_secs: self.uptime_secs() }
            }
            Request::SetState { phase, state } => match self.executor.set_state(phase, state).await {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error { message: e.to_string() },
            },
            Request::Complete { key } => match self.executor.complete(key).await {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error { message: e.to_string() },
            },
            Request::GenerateDebugReport { path } => match self.executor.generate_debug_report(path).await {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error { message: e.to_string() },
            },
            Request::Abort => {
                self.abort();
                Response::Ok
            }
            Request::Shutdown { exit_code, completed } => {
                self.request_shutdown(exit_code, completed);
                Response::Ok
            }
            Request::Execute { .. } => unreachable!("routed to handle_execute"),
        }
    }

    async fn handle_execute(self: Arc<Self>, mut stream: UnixStream, request: Request) {
        let Request::Execute { phase } = request else { return };

        let reader = {
            let mut op = self.operation.lock();
            if op.executing {
                if op.attached {
                    drop(op);
                    let _ = write_response(&mut stream, &Response::AlreadyActive, self.ipc_timeout).await;
                    return;
                }
                op.attached = true;
                op.reader.take()
            } else {
                let (bus, reader) = EventBus::new();
                let cancel = CancellationToken::new();
                op.executing = true;
                op.attached = true;
                op.bus = Some(bus.clone());
                op.cancel = Some(cancel.clone());
                let server = Arc::clone(&self);
                tokio::spawn(async move { server.run_dispatch(phase, bus, cancel).await });
                Some(reader)
            }
        };

        let Some(mut reader) = reader else {
            let _ = write_response(&mut stream, &Response::AlreadyActive, self.ipc_timeout).await;
            return;
        };

        let result = self.stream_events(&mut stream, &mut reader).await;

        let mut op = self.operation.lock();
        op.attached = false;
        if op.executing {
            op.reader = Some(reader);
        }
        if let Err(e) = result {
            log_connection_error(&e);
        }
    }

    /// Deliver events until the stream ends or a write fails. A `pending`
    /// event is always tried first, ahead of pulling a new one off `reader`.
    async fn stream_events(&self, stream: &mut UnixStream, reader: &mut EventReader) -> Result<(), ProtocolError> {
        loop {
            let pending = self.operation.lock().pending.take();
            let event = match pending {
                Some(event) => event,
                None => match reader.next().await {
                    Some(event) => event,
                    None => return Ok(()),
                },
            };

            let terminal = event.is_terminal();
            if let Err(e) = write_response(stream, &Response::Progress { event: event.clone() }, self.ipc_timeout).await {
                self.operation.lock().pending = Some(event);
                return Err(e);
            }

            if terminal {
                let mut op = self.operation.lock();
                op.executing = false;
                op.bus = None;
                op.cancel = None;
                return Ok(());
            }
        }
    }

    async fn run_dispatch(self: Arc<Self>, phase: Option<Phase>, bus: EventBus, cancel: CancellationToken) {
        let event = match self.executor.run(phase, bus.clone(), cancel).await {
            Ok(status) => ProgressEvent::terminal(terminal_message(status), status),
            Err(err) => {
                let precondition = matches!(err, agent_core::CoreError::Precondition(_));
                ProgressEvent::terminal_error_tagged(err.to_string(), Status::Unknown, err.to_string(), precondition)
            }
        };
        bus.send(event);
        bus.close();
    }

    /// Cooperatively cancel the active operation, if any, and push a
    /// terminal `Aborted` event immediately rather than waiting for the
    /// dispatch task to notice the cancellation and do it itself. Also
    /// records the aborted exit code, so the worker goes down with the
    /// no-restart sentinel rather than lingering until some other call
    /// happens to request shutdown.
    pub fn abort(&self) {
        let mut op = self.operation.lock();
        if let Some(cancel) = op.cancel.take() {
            cancel.cancel();
        }
        let was_executing = op.executing;
        if was_executing {
            if let Some(bus) = op.bus.take() {
                bus.send(ProgressEvent::terminal("operation aborted", Status::Aborted));
                bus.close();
            }
        }
        drop(op);

        if was_executing {
            self.request_shutdown(Some(agent_core::EXIT_ABORTED), false);
        }
    }

    /// Idempotent: the exit code is taken from whichever call wins the race
    /// to flip `shutdown_requested`; later calls still wake any waiter.
    pub fn request_shutdown(&self, exit_code: Option<i32>, completed: bool) {
        if !self.shutdown_requested.swap(true, Ordering::SeqCst) {
            let code = exit_code.unwrap_or(if completed {
                agent_core::EXIT_COMPLETED
            } else {
                agent_core::EXIT_GENERIC_FAILURE
            });
            self.exit_code.store(code, Ordering::SeqCst);
        }
        self.shutdown.notify_waiters();
    }
}

fn terminal_message(status: Status) -> &'static str {
    match status {
        Status::Completed => "operation completed",
        Status::CompletedPending => "operation completed, awaiting shutdown",
        Status::Aborted => "operation aborted",
        Status::Unknown => "operation ended",
    }
}

fn log_connection_error(err: &ProtocolError) {
    match err {
        ProtocolError::ConnectionClosed => debug!("client disconnected"),
        other => warn!(error = %other, "connection error"),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
