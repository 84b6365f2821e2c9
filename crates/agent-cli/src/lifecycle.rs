// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle policy (C7): maps a finished `Execute` stream's `(status,
//! error)` pair onto a terminal action against the worker — shut it down,
//! leave it running pending an explicit `Complete`, or generate a debug
//! report before giving up.
//!
//! The policy never holds its own reference to the client: every method
//! takes one as a parameter, which is what breaks what would otherwise be a
//! client-owns-policy/policy-drives-client reference cycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_core::{CoreError, Status};
use agent_supervisor::SupervisorAdapter;
use async_trait::async_trait;

use crate::client::ClientHandle;

/// Notified when an operation finishes in the `CompletedPending` or
/// `Completed` state — e.g. to record the outcome locally.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, status: Status);
}

/// Notified when the operation ends in `Aborted`, so cleanup beyond the
/// client/server RPC exchange (e.g. unregistering from the interrupt
/// handler) can run.
#[async_trait]
pub trait Aborter: Send + Sync {
    async fn abort(&self);
}

/// Notified on a non-cancellation error, when no debug report could be
/// written on the worker host (or none was requested).
#[async_trait]
pub trait DebugReporter: Send + Sync {
    async fn report(&self, error: &CoreError);
}

/// The normal terminal policy: shuts the worker down on completion or
/// failure, requests a debug report on error, and leaves the worker running
/// on `CompletedPending` until a separate `Complete` call arrives.
pub struct AutomaticPolicy {
    pub debug_report_path: Option<PathBuf>,
    pub completer: Option<Arc<dyn Completer>>,
    pub aborter: Option<Arc<dyn Aborter>>,
    pub local_debug_reporter: Option<Arc<dyn DebugReporter>>,
    /// Supervisor + unit name used to poll for the unit going inactive after
    /// a `Shutdown` with one of the no-restart sentinel exit codes. Absent
    /// in contexts (e.g. tests, `Observer` attaches) that never installed a
    /// unit and so have nothing to poll.
    pub supervisor: Option<Arc<dyn SupervisorAdapter>>,
    pub service_name: Option<String>,
    pub shutdown_wait_timeout: Duration,
}

impl Default for AutomaticPolicy {
    fn default() -> Self {
        Self {
            debug_report_path: None,
            completer: None,
            aborter: None,
            local_debug_reporter: None,
            supervisor: None,
            service_name: None,
            shutdown_wait_timeout: Duration::from_secs(10),
        }
    }
}

/// A policy that only surfaces the outcome, touching neither the worker's
/// lifecycle nor debug reporting — for connection strategies (observer)
/// that attach without taking ownership of the worker's lifetime.
pub struct NoopPolicy;

pub enum LifecyclePolicy {
    Automatic(AutomaticPolicy),
    Noop(NoopPolicy),
}

impl LifecyclePolicy {
    pub async fn handle_status(
        &self,
        client: &ClientHandle,
        status: Status,
        err: Option<CoreError>,
    ) -> Result<(), CoreError> {
        match self {
            LifecyclePolicy::Noop(_) => match err {
                Some(e) => Err(e),
                None => Ok(()),
            },
            LifecyclePolicy::Automatic(policy) => policy.handle(client, status, err).await,
        }
    }

    /// Terminal action for an operation the caller has just marked
    /// completed externally (spec §4.4's `Complete(key)`): the `server.
    /// Complete(key)` RPC itself is the caller's job (see
    /// `ClientRuntime::complete`); this runs the same shutdown/completer
    /// action `handle_status` would have taken for a `Completed` status.
    pub async fn complete(&self, client: &ClientHandle) -> Result<(), CoreError> {
        match self {
            LifecyclePolicy::Noop(_) => Ok(()),
            LifecyclePolicy::Automatic(policy) => policy.complete(client).await,
        }
    }
}

impl AutomaticPolicy {
    async fn handle(&self, client: &ClientHandle, status: Status, err: Option<CoreError>) -> Result<(), CoreError> {
        match err {
            None => self.handle_terminal_status(client, status).await,
            Some(CoreError::Cancellation) => {
                if let Some(aborter) = &self.aborter {
                    aborter.abort().await;
                }
                Err(CoreError::Cancellation)
            }
            Some(err) => self.handle_error(client, err).await,
        }
    }

    async fn handle_terminal_status(&self, client: &ClientHandle, status: Status) -> Result<(), CoreError> {
        match status {
            Status::Unknown => {
                self.shutdown_and_wait(client, None, false).await;
                Ok(())
            }
            Status::Aborted => {
                if let Some(aborter) = &self.aborter {
                    aborter.abort().await;
                }
                Err(CoreError::Cancellation)
            }
            Status::Completed => {
                tracing::info!("operation completed");
                self.shutdown_and_wait(client, Some(agent_core::EXIT_COMPLETED), true).await;
                if let Some(completer) = &self.completer {
                    completer.complete(status).await;
                }
                Ok(())
            }
            Status::CompletedPending => {
                tracing::info!("operation completed, awaiting explicit shutdown");
                if let Some(completer) = &self.completer {
                    completer.complete(status).await;
                }
                Ok(())
            }
        }
    }

    /// Shut the worker down with the completed sentinel and notify the
    /// completer, exactly as the `Completed` terminal-status path does.
    async fn complete(&self, client: &ClientHandle) -> Result<(), CoreError> {
        tracing::info!("operation marked completed externally");
        self.shutdown_and_wait(client, Some(agent_core::EXIT_COMPLETED), true).await;
        if let Some(completer) = &self.completer {
            completer.complete(Status::Completed).await;
        }
        Ok(())
    }

    async fn handle_error(&self, client: &ClientHandle, err: CoreError) -> Result<(), CoreError> {
        let reported = match &self.debug_report_path {
            Some(path) => client.generate_debug_report(path.clone()).await.is_ok(),
            None => false,
        };
        if !reported {
            if let Some(reporter) = &self.local_debug_reporter {
                reporter.report(&err).await;
            }
        }

        let exit_code = if matches!(err, CoreError::Precondition(_)) {
            Some(agent_core::EXIT_FAILED_PRECONDITION)
        } else {
            None
        };
        self.shutdown_and_wait(client, exit_code, false).await;
        Err(err)
    }

    /// Issue `Shutdown`, then — if the resolved exit code is one of the
    /// no-restart sentinels and a supervisor/unit name were configured —
    /// poll the unit's status until it reports inactive or
    /// `shutdown_wait_timeout` elapses. `None` resolves to the generic
    /// failure code, which is never a sentinel, so only the completed,
    /// aborted, and failed-precondition paths ever wait.
    async fn shutdown_and_wait(&self, client: &ClientHandle, exit_code: Option<i32>, completed: bool) {
        shutdown_ignoring_unavailable(client, exit_code, completed).await;

        let resolved = exit_code.unwrap_or(agent_core::EXIT_GENERIC_FAILURE);
        if !agent_core::no_restart_exit_codes().contains(&resolved) {
            return;
        }
        let (Some(supervisor), Some(service_name)) = (&self.supervisor, &self.service_name) else {
            return;
        };

        let deadline = Instant::now() + self.shutdown_wait_timeout;
        loop {
            match supervisor.is_active(service_name).await {
                Ok(false) => return,
                Ok(true) if Instant::now() >= deadline => {
                    tracing::warn!(unit = %service_name, "unit still active after shutdown-wait timeout");
                    return;
                }
                Ok(true) => tokio::time::sleep(Duration::from_millis(100)).await,
                Err(e) => {
                    tracing::debug!(error = %e, "status poll failed during shutdown-wait, treating as stopped");
                    return;
                }
            }
        }
    }
}

async fn shutdown_ignoring_unavailable(client: &ClientHandle, exit_code: Option<i32>, completed: bool) {
    if let Err(e) = client.shutdown(exit_code, completed).await {
        if !e.is_server_unavailable() {
            tracing::warn!(error = %e, "shutdown request failed");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
