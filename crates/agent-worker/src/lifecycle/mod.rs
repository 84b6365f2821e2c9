// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle management: startup and shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. `~/.local/state/agentd`).
    pub state_dir: PathBuf,
    /// Path to the worker's Unix socket.
    pub socket_path: PathBuf,
    /// Path to the lock/PID file, used for single-instance enforcement.
    pub lock_path: PathBuf,
    /// Path to the worker log file.
    pub log_path: PathBuf,
}

impl Config {
    /// Load configuration using the env-resolved state directory.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("agentd.sock"),
            lock_path: state_dir.join("agentd.pid"),
            log_path: state_dir.join("agentd.log"),
            state_dir,
        })
    }
}

/// Worker state during operation.
pub struct WorkerState {
    pub config: Config,
    // Held to maintain the exclusive file lock; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    pub start_time: Instant,
}

/// Result of worker startup: the state plus the bound listener, returned
/// separately so the caller can spawn the accept loop itself.
pub struct StartupResult {
    pub worker: WorkerState,
    pub listener: UnixListener,
}

impl WorkerState {
    pub fn new(config: Config, lock_file: File) -> Self {
        Self { config, lock_file, start_time: Instant::now() }
    }

    /// Tear down on-disk artifacts. The lock file is released automatically
    /// when `self.lock_file` drops.
    pub fn shutdown(&self) {
        info!("shutting down worker");

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("failed to remove socket file: {}", e);
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove pid file: {}", e);
            }
        }

        info!("worker shutdown complete");
    }
}

/// Lifecycle errors.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: worker already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
