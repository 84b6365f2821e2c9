// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::OperationKey;

/// Sentinel phase id meaning "resume the whole plan" (the root phase).
pub const ROOT_PHASE_ID: &str = "/";

/// A node in an operation plan.
///
/// `id == ROOT_PHASE_ID` names the root phase (the entire plan); any other
/// id names a subplan to execute or roll back in isolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub key: OperationKey,
    pub id: String,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub rollback: bool,
}

impl Phase {
    /// The root phase for `key` — resumes the whole plan.
    pub fn root(key: OperationKey) -> Self {
        Self { key, id: ROOT_PHASE_ID.to_string(), force: false, rollback: false }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_PHASE_ID
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
