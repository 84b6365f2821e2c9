// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client runtime (C6): drives one `Execute` stream to its terminal event,
//! printing progress as it goes, racing the stream against the interrupt
//! handler so a signal returns control immediately rather than waiting for
//! the worker to notice.

use std::sync::Arc;

use agent_core::{CoreError, OperationKey, Phase, Status};

use crate::client::{ClientHandle, ExecuteStream};
use crate::interrupt::InterruptHandle;
use crate::lifecycle::LifecyclePolicy;

/// Where progress messages go. A trait rather than a bare `println!` so
/// tests can capture output instead of writing to stdout.
pub trait Printer: Send + Sync {
    fn print(&self, message: &str);
}

pub struct StdoutPrinter;

impl Printer for StdoutPrinter {
    fn print(&self, message: &str) {
        println!("{message}");
    }
}

pub struct ClientRuntime {
    handle: ClientHandle,
    printer: Arc<dyn Printer>,
}

impl ClientRuntime {
    pub fn new(handle: ClientHandle, printer: Arc<dyn Printer>) -> Self {
        Self { handle, printer }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.handle
    }

    /// Resume the whole plan from wherever it left off.
    pub async fn run(&self, interrupt: &InterruptHandle) -> (Status, Option<CoreError>) {
        self.execute(None, interrupt).await
    }

    pub async fn execute_phase(&self, mut phase: Phase, interrupt: &InterruptHandle) -> (Status, Option<CoreError>) {
        phase.rollback = false;
        self.execute(Some(phase), interrupt).await
    }

    pub async fn rollback_phase(&self, mut phase: Phase, interrupt: &InterruptHandle) -> (Status, Option<CoreError>) {
        phase.rollback = true;
        self.execute(Some(phase), interrupt).await
    }

    /// Mark `key` completed on the worker (the human-override path for an
    /// operation left running in `CompletedPending`), then delegate to
    /// `policy` for the same terminal action a `Completed` status would
    /// have triggered — shutting the worker down with the completed
    /// sentinel and notifying the configured completer.
    pub async fn complete(&self, key: OperationKey, policy: &LifecyclePolicy) -> Result<(), CoreError> {
        self.handle.complete(key).await.map_err(|e| e.into_core_error())?;
        policy.complete(&self.handle).await
    }

    async fn execute(&self, phase: Option<Phase>, interrupt: &InterruptHandle) -> (Status, Option<CoreError>) {
        let stream = match self.handle.execute(phase).await {
            Ok(s) => s,
            Err(e) => return (Status::Unknown, Some(e.into_core_error())),
        };

        let printer = Arc::clone(&self.printer);
        let (result_tx, result_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let outcome = progress_loop(stream, printer.as_ref()).await;
            let _ = result_tx.send(outcome);
        });

        tokio::select! {
            biased;
            result = result_rx => result.unwrap_or((
                Status::Unknown,
                Some(CoreError::Transport("progress loop ended without a result".to_string())),
            )),
            // The interrupt handler's own aborter (registered by whoever
            // builds this runtime) has already told the server to cancel by
            // the time `done` resolves; returning here is a sentinel so the
            // caller doesn't block on the stream actually closing.
            _ = interrupt.done() => (Status::Unknown, Some(CoreError::Cancellation)),
        }
    }
}

async fn progress_loop(mut stream: ExecuteStream, printer: &dyn Printer) -> (Status, Option<CoreError>) {
    loop {
        match stream.next().await {
            Ok(Some(event)) => {
                if let Some(error) = &event.error {
                    let core_error = if error.precondition {
                        CoreError::Precondition(error.message.clone())
                    } else {
                        CoreError::Operation(error.message.clone())
                    };
                    return (event.status, Some(core_error));
                }
                printer.print(&event.message);
                if event.status.is_terminal() {
                    return (event.status, None);
                }
            }
            Ok(None) => return (Status::Unknown, None),
            Err(e) if e.is_server_unavailable() => return (Status::Unknown, None),
            Err(e) => return (Status::Unknown, Some(e.into_core_error())),
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
