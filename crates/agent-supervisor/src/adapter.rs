// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;

use crate::{ServiceStatus, StartMode, SupervisorError, UnitSpec};

/// Thin facade over a host supervisor (systemd, launchd, ...).
///
/// `name` throughout may be an absolute path to a unit file or a relative
/// service name; resolving that distinction is each implementation's job.
#[async_trait]
pub trait SupervisorAdapter: Send + Sync + 'static {
    async fn install(&self, spec: &UnitSpec) -> Result<(), SupervisorError>;

    async fn start(&self, name: &str, mode: StartMode) -> Result<(), SupervisorError>;

    async fn stop(&self, name: &str) -> Result<(), SupervisorError>;

    /// Disable the unit so it no longer starts automatically. `now` also
    /// stops it immediately rather than waiting for its next natural exit.
    async fn disable(&self, name: &str, now: bool) -> Result<(), SupervisorError>;

    async fn uninstall(&self, name: &str) -> Result<(), SupervisorError>;

    async fn is_active(&self, name: &str) -> Result<bool, SupervisorError>;

    async fn status(&self, name: &str) -> Result<ServiceStatus, SupervisorError>;

    /// Whether `err` represents "no such unit", as opposed to some other
    /// failure (permission denied, supervisor unreachable, ...).
    fn is_unknown_service_error(&self, err: &SupervisorError) -> bool {
        matches!(err, SupervisorError::UnitNotFound(_))
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
