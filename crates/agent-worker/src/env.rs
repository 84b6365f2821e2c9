// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version reported in the `Hello` handshake.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix used to select which environment variables a supervisor unit
/// propagates into the worker process.
pub const ENV_PROPAGATION_PREFIX: &str = "AGENTD_";

/// Resolve state directory: `AGENTD_STATE_DIR` > `XDG_STATE_HOME/agentd` >
/// `~/.local/state/agentd`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("AGENTD_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("agentd"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/agentd"))
}

/// Bound on how long the server waits for a framed request or response.
pub fn ipc_timeout() -> Duration {
    std::env::var("AGENTD_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Bound on the best-effort event drain performed when the bus is closed.
pub fn drain_timeout() -> Duration {
    std::env::var("AGENTD_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
