// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use agent_core::{OperationKey, Phase};

/// Request sent from the CLI front-end to the worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check.
    Ping,

    /// Version handshake, sent as the first message over any connection.
    Hello {
        version: String,
    },

    /// Start or resume the operation. `phase` is absent to resume the whole
    /// plan from where it left off, present to execute or roll back a single
    /// phase.
    Execute {
        #[serde(default)]
        phase: Option<Phase>,
    },

    /// Force the plan state machine into `state` for `phase` without running it.
    SetState {
        phase: Phase,
        state: String,
    },

    /// Mark an operation completed externally (human override).
    Complete {
        key: OperationKey,
    },

    /// Signal cooperative cancellation of any active `Execute`.
    Abort,

    /// Ask the worker to exit.
    Shutdown {
        #[serde(default)]
        exit_code: Option<i32>,
        #[serde(default)]
        completed: bool,
    },

    /// Write a debug archive to `path` on the worker host.
    GenerateDebugReport {
        path: PathBuf,
    },

    /// Worker liveness/identity snapshot, used by connection strategies that
    /// attach to a worker that may already be running.
    Status,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
