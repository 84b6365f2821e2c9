// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::PathBuf;

/// Restart policy for an installed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Restart on any exit not listed in `no_restart_exit_codes`.
    Always,
    /// Never restart; the unit runs exactly once per `Start`.
    Never,
}

/// Everything the supervisor adapter needs to install a unit.
///
/// The name may be an absolute path to a unit file or a relative service
/// name; resolving that distinction is the adapter's responsibility, not
/// this type's.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    /// Unit name, or absolute path to a unit file.
    pub name: String,
    /// Full argv of the start command (`argv[0]` is the binary).
    pub exec_start: Vec<String>,
    /// Commands run (in order) before `exec_start`, each as its own argv.
    pub pre_start: Vec<Vec<String>>,
    /// Environment variables propagated into the unit.
    pub environment: HashMap<String, String>,
    /// Working directory for the unit's process.
    pub working_directory: Option<PathBuf>,
    pub restart: RestartPolicy,
    /// Exit codes that must not trigger an automatic restart.
    pub no_restart_exit_codes: Vec<i32>,
    /// Exit codes treated as a successful run.
    pub success_exit_codes: Vec<i32>,
    /// Target the unit is wanted by (e.g. `default.target`).
    pub wanted_by: String,
    /// Whether the unit is considered "ready" as soon as it exits, rather
    /// than only while running (used by one-shot observer attaches).
    pub ready_after_exit: bool,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>, exec_start: Vec<String>) -> Self {
        Self {
            name: name.into(),
            exec_start,
            pre_start: Vec::new(),
            environment: HashMap::new(),
            working_directory: None,
            restart: RestartPolicy::Always,
            no_restart_exit_codes: Vec::new(),
            success_exit_codes: Vec::new(),
            wanted_by: "default.target".to_string(),
            ready_after_exit: false,
        }
    }
}

/// Whether `Start` should block until the unit reports active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Blocking,
    NonBlocking,
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
