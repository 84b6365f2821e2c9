// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::{EXIT_ABORTED, EXIT_FAILED_PRECONDITION, EXIT_GENERIC_FAILURE};

/// Abstract error taxonomy shared by every crate in the workspace.
///
/// Each variant corresponds to one of the six kinds described for the
/// error-handling design: validation, precondition, transport, operation,
/// cancellation, supervisor. Kinds are abstract (no crate-specific payload
/// types live here); concrete errors convert into this via `From` at crate
/// boundaries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is internally inconsistent. Never retried.
    #[error("validation: {0}")]
    Validation(String),

    /// Host is not in a valid state to start an operation.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The socket is unreachable or the dial timed out.
    #[error("transport: {0}")]
    Transport(String),

    /// The executor returned an error mid-plan.
    #[error("operation failed: {0}")]
    Operation(String),

    /// Interrupt-driven cancellation.
    #[error("cancelled")]
    Cancellation,

    /// Unit install/uninstall/start failed.
    #[error("supervisor: {0}")]
    Supervisor(String),
}

impl CoreError {
    /// The worker's process exit code for this error, per the exit-code table.
    ///
    /// `Cancellation` maps to the aborted code rather than the generic one so
    /// the supervisor's restart-prevent set actually catches it; callers that
    /// need the "completed" code (no error at all) use `EXIT_COMPLETED`
    /// directly rather than through this method.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Precondition(_) => EXIT_FAILED_PRECONDITION,
            CoreError::Cancellation => EXIT_ABORTED,
            CoreError::Validation(_) | CoreError::Transport(_) | CoreError::Operation(_) | CoreError::Supervisor(_) => {
                EXIT_GENERIC_FAILURE
            }
        }
    }

    /// Whether a successful shutdown should still be reported as one, i.e.
    /// this error occurred while the worker was already going down.
    pub fn is_transport_during_shutdown(&self) -> bool {
        matches!(self, CoreError::Transport(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
