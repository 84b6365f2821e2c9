// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable access for the CLI. Mirrors the worker's own
//! `AGENTD_STATE_DIR` precedence so both ends agree on where the socket
//! lives without the client having to ask the server.

use std::path::PathBuf;
use std::time::Duration;

use agent_core::OperationKey;
use anyhow::{Context, Result};

const SOCKET_FILE_NAME: &str = "agentd.sock";

/// Resolve state directory: `AGENTD_STATE_DIR` > `XDG_STATE_HOME/agentd` >
/// `~/.local/state/agentd`.
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("AGENTD_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("agentd"));
    }
    let home = std::env::var("HOME").context("HOME is not set and AGENTD_STATE_DIR is unset")?;
    Ok(PathBuf::from(home).join(".local/state/agentd"))
}

pub fn socket_path() -> Result<PathBuf> {
    Ok(state_dir()?.join(SOCKET_FILE_NAME))
}

/// Bound on how long a connection strategy dials before giving up.
pub fn connect_timeout() -> Duration {
    std::env::var("AGENTCTL_CONNECT_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Bound on how long the interrupt handler waits for cleanups to finish
/// before giving up and letting the process exit anyway.
pub fn cleanup_timeout() -> Duration {
    std::env::var("AGENTCTL_CLEANUP_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Bound on how long the lifecycle policy polls the supervisor for a unit
/// to report inactive after a `Shutdown` with a no-restart sentinel code.
pub fn shutdown_wait_timeout() -> Duration {
    std::env::var("AGENTCTL_SHUTDOWN_WAIT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Derive the supervisor unit name for an operation: unique per
/// account/cluster so two operations never contend for the same unit.
pub fn service_name(key: &OperationKey) -> String {
    let sanitize = |s: &str| -> String { s.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '-' }).collect() };
    format!("agentd-{}-{}.service", sanitize(&key.account_id), sanitize(&key.cluster_name))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
