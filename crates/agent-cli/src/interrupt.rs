// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interrupt handler (C8): bridges host termination signals into
//! cooperative cancellation. Stoppers and aborters register themselves at
//! runtime through a channel rather than a mutable list, so registration
//! never races the handler's own signal-watching task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

/// A cleanup that should run on a graceful stop (no cancellation involved).
#[async_trait]
pub trait Stopper: Send + Sync {
    async fn stop(&self);
}

/// A cleanup that should run when the handler fires due to an interrupt —
/// typically telling the server to cooperatively cancel its active operation.
#[async_trait]
pub trait Aborter: Send + Sync {
    async fn abort(&self);
}

enum Cleanup {
    Stop(Arc<dyn Stopper>),
    Abort(Arc<dyn Aborter>),
}

/// Registration side: add cleanups as components come up.
pub struct InterruptHandler {
    register: mpsc::UnboundedSender<Cleanup>,
    root: CancellationToken,
    done: Arc<Notify>,
}

/// Read-only side, cheap to clone and hand to every task that needs to race
/// its own work against an interrupt.
#[derive(Clone)]
pub struct InterruptHandle {
    root: CancellationToken,
    done: Arc<Notify>,
}

impl InterruptHandle {
    /// Resolves once the interrupt has fired and every registered cleanup
    /// has run (or timed out).
    pub async fn done(&self) {
        self.done.notified().await;
    }

    pub fn is_interrupted(&self) -> bool {
        self.root.is_cancelled()
    }
}

impl InterruptHandler {
    /// Spawns the signal-watching task and returns the registration handle
    /// plus a read-only handle for callers to race against.
    pub fn spawn(cleanup_timeout: Duration) -> (Self, InterruptHandle) {
        let (tx, rx) = mpsc::unbounded_channel::<Cleanup>();
        let root = CancellationToken::new();
        let done = Arc::new(Notify::new());

        tokio::spawn(watch(rx, root.clone(), Arc::clone(&done), cleanup_timeout));

        (Self { register: tx, root: root.clone(), done: Arc::clone(&done) }, InterruptHandle { root, done })
    }

    pub fn add_stopper(&self, stopper: Arc<dyn Stopper>) {
        let _ = self.register.send(Cleanup::Stop(stopper));
    }

    pub fn add_aborter(&self, aborter: Arc<dyn Aborter>) {
        let _ = self.register.send(Cleanup::Abort(aborter));
    }

    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle { root: self.root.clone(), done: Arc::clone(&self.done) }
    }
}

async fn watch(
    mut register: mpsc::UnboundedReceiver<Cleanup>,
    root: CancellationToken,
    done: Arc<Notify>,
    cleanup_timeout: Duration,
) {
    let mut cleanups = Vec::new();

    loop {
        tokio::select! {
            biased;
            cleanup = register.recv() => match cleanup {
                Some(c) => cleanups.push(c),
                None => return,
            },
            () = wait_for_interrupt() => break,
        }
    }

    root.cancel();

    // Drain anything registered between the interrupt firing and this point
    // — a stopper/aborter added mid-shutdown still gets a chance to run.
    while let Ok(cleanup) = register.try_recv() {
        cleanups.push(cleanup);
    }

    for cleanup in &cleanups {
        let run = async {
            match cleanup {
                Cleanup::Stop(s) => s.stop().await,
                Cleanup::Abort(a) => a.abort().await,
            }
        };
        let _ = tokio::time::timeout(cleanup_timeout, run).await;
    }

    done.notify_waiters();

    // Re-armed: every registered cleanup has already run once. A second
    // signal past this point is delivered verbatim to the runtime — the
    // operator wants out now, so kill the process instead of running
    // another cleanup pass that may itself be stuck. If the handler itself
    // has since been dropped (a normal, non-interrupted shutdown) there's
    // no owner left to care about a stray second signal, so stop watching.
    loop {
        tokio::select! {
            biased;
            cleanup = register.recv() => match cleanup {
                Some(_) => continue,
                None => return,
            },
            () = wait_for_interrupt() => std::process::exit(FORCE_EXIT_CODE),
        }
    }
}

/// Conventional shell exit code for "killed by SIGINT" (128 + signal 2).
const FORCE_EXIT_CODE: i32 = 130;

async fn wait_for_interrupt() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
