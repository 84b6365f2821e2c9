// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to be the single place that terminates the
//! process.

use std::fmt;

use agent_core::CoreError;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<CoreError> for ExitError {
    fn from(err: CoreError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl From<crate::strategy::StrategyError> for ExitError {
    fn from(err: crate::strategy::StrategyError) -> Self {
        Self::new(agent_core::EXIT_GENERIC_FAILURE, err.to_string())
    }
}

impl From<crate::client::ClientError> for ExitError {
    fn from(err: crate::client::ClientError) -> Self {
        Self::new(agent_core::EXIT_GENERIC_FAILURE, err.to_string())
    }
}
