// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use agent_core::ProgressEvent;

/// Response sent from the worker to the CLI front-end.
///
/// `Execute` is the one streaming method: the worker writes a `Progress`
/// message per event over the same framed connection, followed by exactly
/// one terminal message (`Progress` whose event `is_terminal()`, or `Error`)
/// before closing. Every other request gets exactly one response message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success (`SetState`, `Complete`, `Shutdown`, `GenerateDebugReport`).
    Ok,

    /// Health check response.
    Pong,

    /// Version handshake response.
    Hello { version: String },

    /// One event in an `Execute` stream.
    Progress { event: ProgressEvent },

    /// Worker liveness/identity snapshot.
    Status { active: bool, uptime_secs: u64 },

    /// A second `Execute` arrived while one was already active.
    AlreadyActive,

    /// Request rejected or failed; carries a human-readable message.
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
