// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{ServiceStatus, StartMode, SupervisorAdapter, SupervisorError, UnitSpec};

/// In-memory supervisor adapter for tests. Installed units are tracked by
/// name; `status` reflects whatever `start`/`stop` last recorded, with no
/// real process behind it.
#[derive(Default)]
pub struct FakeSupervisorAdapter {
    units: Mutex<HashMap<String, (UnitSpec, ServiceStatus)>>,
}

impl FakeSupervisorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed_units(&self) -> Vec<String> {
        self.units.lock().keys().cloned().collect()
    }

    /// Force a unit's reported status, bypassing `start`/`stop`, for tests
    /// that want to exercise status-polling call sites directly.
    pub fn set_status(&self, name: &str, status: ServiceStatus) {
        if let Some(entry) = self.units.lock().get_mut(name) {
            entry.1 = status;
        }
    }
}

#[async_trait]
impl SupervisorAdapter for FakeSupervisorAdapter {
    async fn install(&self, spec: &UnitSpec) -> Result<(), SupervisorError> {
        self.units.lock().insert(spec.name.clone(), (spec.clone(), ServiceStatus::Inactive));
        Ok(())
    }

    async fn start(&self, name: &str, _mode: StartMode) -> Result<(), SupervisorError> {
        let mut units = self.units.lock();
        let entry = units.get_mut(name).ok_or_else(|| SupervisorError::UnitNotFound(name.to_string()))?;
        entry.1 = ServiceStatus::Active;
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<(), SupervisorError> {
        let mut units = self.units.lock();
        let entry = units.get_mut(name).ok_or_else(|| SupervisorError::UnitNotFound(name.to_string()))?;
        entry.1 = ServiceStatus::Inactive;
        Ok(())
    }

    async fn disable(&self, name: &str, now: bool) -> Result<(), SupervisorError> {
        if now {
            self.stop(name).await?;
        }
        Ok(())
    }

    async fn uninstall(&self, name: &str) -> Result<(), SupervisorError> {
        self.units.lock().remove(name);
        Ok(())
    }

    async fn is_active(&self, name: &str) -> Result<bool, SupervisorError> {
        Ok(self.status(name).await?.is_active())
    }

    async fn status(&self, name: &str) -> Result<ServiceStatus, SupervisorError> {
        Ok(self.units.lock().get(name).map(|(_, status)| *status).unwrap_or(ServiceStatus::Unknown))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
