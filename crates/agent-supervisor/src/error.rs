// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from supervisor operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("unit {0} not found")]
    UnitNotFound(String),

    #[error("install failed: {0}")]
    Install(String),

    #[error("start failed: {0}")]
    Start(String),

    #[error("stop failed: {0}")]
    Stop(String),

    #[error("status query failed: {0}")]
    Status(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
