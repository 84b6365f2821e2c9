// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Closed enumeration of terminal (and non-terminal) operation states.
///
/// A tagged enum rather than a bag of booleans, so the lifecycle decision
/// table (see `agent-cli::lifecycle`) can match exhaustively instead of
/// reasoning about combinations of `IsCompleted`/`IsAborted` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Non-terminal: the operation is still running, or the stream ended
    /// without reaching a terminal event (disconnect, EOF).
    Unknown,
    /// The operation finished normally; the worker should shut down.
    Completed,
    /// The operation finished logically, but the worker must keep running
    /// until the client explicitly orders shutdown (see `Complete` RPC).
    CompletedPending,
    /// The operation was cancelled, cooperatively, via `Abort`.
    Aborted,
}

impl Status {
    /// Whether this status ends an Execute stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::CompletedPending | Status::Aborted)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
