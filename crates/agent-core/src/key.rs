// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a logical operation across client reconnects.
///
/// Immutable once assigned: the triple `(account_id, cluster_name,
/// operation_id)` is what a reconnecting client presents to resume an
/// in-flight install or join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub account_id: String,
    pub cluster_name: String,
    pub operation_id: String,
}

impl OperationKey {
    pub fn new(
        account_id: impl Into<String>,
        cluster_name: impl Into<String>,
        operation_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            cluster_name: cluster_name.into(),
            operation_id: operation_id.into(),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.account_id, self.cluster_name, self.operation_id)
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
