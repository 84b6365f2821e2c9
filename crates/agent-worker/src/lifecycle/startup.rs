// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker startup logic.

use std::io::Write;

use fs2::FileExt;
use tokio::net::UnixListener;
use tracing::info;

use super::{Config, LifecycleError, StartupResult, WorkerState};

/// Start the worker: create the state directory, acquire the single-instance
/// lock, and bind the IPC socket.
pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(&config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up on a lock failure — those files belong to the
            // already-running worker.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating so a failed lock attempt never wipes the
    // running worker's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "worker started");

    Ok(StartupResult { worker: WorkerState::new(config.clone(), lock_file), listener })
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
