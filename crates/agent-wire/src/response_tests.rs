// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_core::Status;

#[test]
fn progress_roundtrips_a_terminal_event() {
    let event = ProgressEvent::terminal("done", Status::Completed);
    let response = Response::Progress { event: event.clone() };
    let json = serde_json::to_string(&response).expect("serialize");
    let back: Response = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, Response::Progress { event });
}

#[test]
fn error_carries_message() {
    let response = Response::Error { message: "already-active".to_string() };
    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["message"], "already-active");
}
