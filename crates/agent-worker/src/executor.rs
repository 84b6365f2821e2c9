// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor facade (C3): the opaque operation engine. Business logic for
//! cluster provisioning, plan generation, endpoint reporting, log upload,
//! and audit events lives behind this trait and is out of scope here — the
//! only contract is that an implementation can execute a plan, roll back a
//! phase, and that while it works it publishes events into the bus it's
//! handed.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use agent_core::{CoreError, OperationKey, Phase, Status};

use crate::event_bus::EventBus;

/// Runs (or resumes) an operation plan, or rolls back a single phase.
///
/// `phase = None` resumes the whole plan from where it left off; `Some`
/// executes (or, if `phase.rollback`, rolls back) that one phase.
/// Implementations must observe `cancel` promptly — there is no guarantee
/// the caller waits for a clean return once it signals cancellation.
///
/// The other three methods cover the server's remaining unary requests;
/// all of it — plan generation, endpoint reporting, log upload, audit
/// emission — is opaque here, reachable only through this trait.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn run(
        &self,
        phase: Option<Phase>,
        bus: EventBus,
        cancel: CancellationToken,
    ) -> Result<Status, CoreError>;

    /// Force the plan state machine into `state` for `phase` without running it.
    async fn set_state(&self, phase: Phase, state: String) -> Result<(), CoreError>;

    /// Mark an operation completed externally (human override).
    async fn complete(&self, key: OperationKey) -> Result<(), CoreError>;

    /// Write a debug archive to `path` on the worker host.
    async fn generate_debug_report(&self, path: PathBuf) -> Result<(), CoreError>;
}

/// The plan-execution engine's real implementation — cluster provisioning,
/// plan generation, endpoint reporting, log upload, audit events — is an
/// external collaborator not reproduced here. This stub satisfies the trait
/// so `agentd` links and runs end to end; every method fails with
/// [`CoreError::Operation`] naming the call that has no real backing.
pub struct UnimplementedExecutor;

#[async_trait]
impl Executor for UnimplementedExecutor {
    async fn run(&self, _phase: Option<Phase>, _bus: EventBus, _cancel: CancellationToken) -> Result<Status, CoreError> {
        Err(CoreError::Operation("run: no operation engine wired in".to_string()))
    }

    async fn set_state(&self, _phase: Phase, _state: String) -> Result<(), CoreError> {
        Err(CoreError::Operation("set_state: no operation engine wired in".to_string()))
    }

    async fn complete(&self, _key: OperationKey) -> Result<(), CoreError> {
        Err(CoreError::Operation("complete: no operation engine wired in".to_string()))
    }

    async fn generate_debug_report(&self, _path: PathBuf) -> Result<(), CoreError> {
        Err(CoreError::Operation("generate_debug_report: no operation engine wired in".to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeExecutor;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use agent_core::ProgressEvent;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Scripted executor for tests: emits a fixed sequence of progress
    /// messages, then returns a canned `(status, error)` outcome. Honors
    /// cancellation by returning `Ok(Status::Aborted)` as soon as the token
    /// fires, regardless of how much of the script has run.
    pub struct FakeExecutor {
        messages: Vec<String>,
        outcome: Mutex<Option<Result<Status, CoreError>>>,
        runs: Arc<Mutex<u32>>,
        states: Mutex<HashMap<String, String>>,
        completed: Mutex<Vec<OperationKey>>,
        debug_reports: Mutex<Vec<PathBuf>>,
    }

    impl FakeExecutor {
        pub fn new(messages: Vec<&str>, outcome: Result<Status, CoreError>) -> Self {
            Self {
                messages: messages.into_iter().map(str::to_string).collect(),
                outcome: Mutex::new(Some(outcome)),
                runs: Arc::new(Mutex::new(0)),
                states: Mutex::new(HashMap::new()),
                completed: Mutex::new(Vec::new()),
                debug_reports: Mutex::new(Vec::new()),
            }
        }

        pub fn run_count(&self) -> u32 {
            *self.runs.lock()
        }

        pub fn state_of(&self, phase_id: &str) -> Option<String> {
            self.states.lock().get(phase_id).cloned()
        }

        pub fn completed_keys(&self) -> Vec<OperationKey> {
            self.completed.lock().clone()
        }

        pub fn debug_report_paths(&self) -> Vec<PathBuf> {
            self.debug_reports.lock().clone()
        }
    }

    #[async_trait]
    impl Executor for FakeExecutor {
        async fn run(
            &self,
            _phase: Option<Phase>,
            bus: EventBus,
            cancel: CancellationToken,
        ) -> Result<Status, CoreError> {
            *self.runs.lock() += 1;
            for (i, message) in self.messages.iter().enumerate() {
                if cancel.is_cancelled() {
                    return Ok(Status::Aborted);
                }
                let completion = ProgressEvent::completion_from_fraction(
                    (i + 1) as f64 / self.messages.len().max(1) as f64,
                );
                bus.send(ProgressEvent::progress(message.clone(), completion));

                // A brief pause between steps, interruptible by cancellation,
                // so a reader (or an abort racing this run) reliably observes
                // each step instead of the whole script landing in one poll.
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(Status::Aborted),
                    _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
                }
            }
            self.outcome.lock().take().unwrap_or(Ok(Status::Unknown))
        }

        async fn set_state(&self, phase: Phase, state: String) -> Result<(), CoreError> {
            self.states.lock().insert(phase.id, state);
            Ok(())
        }

        async fn complete(&self, key: OperationKey) -> Result<(), CoreError> {
            self.completed.lock().push(key);
            Ok(())
        }

        async fn generate_debug_report(&self, path: PathBuf) -> Result<(), CoreError> {
            self.debug_reports.lock().push(path);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
