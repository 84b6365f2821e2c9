// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::Status;

/// A single message in an `Execute` stream (server to client).
///
/// `completion` is a percentage in `0..=100`; callers that only have a
/// fraction convert with [`ProgressEvent::completion_from_fraction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub message: String,
    pub completion: u8,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EventError>,
}

/// The error payload carried by a terminal `ProgressEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventError {
    pub message: String,
    /// Whether the originating error was a failed-precondition, so the
    /// client can tell it apart from a generic operation failure without
    /// the worker's full error taxonomy crossing the wire.
    #[serde(default)]
    pub precondition: bool,
}

impl ProgressEvent {
    /// A plain, non-terminal progress update.
    pub fn progress(message: impl Into<String>, completion: u8) -> Self {
        Self { message: message.into(), completion: completion.min(100), status: Status::Unknown, error: None }
    }

    /// A terminal event carrying `status` and no error.
    pub fn terminal(message: impl Into<String>, status: Status) -> Self {
        Self { message: message.into(), completion: 100, status, error: None }
    }

    /// A terminal event carrying an error message alongside `status`.
    pub fn terminal_error(message: impl Into<String>, status: Status, error: impl Into<String>) -> Self {
        Self::terminal_error_tagged(message, status, error, false)
    }

    /// As [`ProgressEvent::terminal_error`], additionally tagging the error
    /// as a failed-precondition so it survives the trip across the wire.
    pub fn terminal_error_tagged(
        message: impl Into<String>,
        status: Status,
        error: impl Into<String>,
        precondition: bool,
    ) -> Self {
        Self {
            message: message.into(),
            completion: 100,
            status,
            error: Some(EventError { message: error.into(), precondition }),
        }
    }

    /// Whether this event ends its stream.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal() || self.error.is_some()
    }

    /// Convert a `0.0..=1.0` fraction into the `0..=100` completion scale.
    pub fn completion_from_fraction(fraction: f64) -> u8 {
        (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
