// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! macOS supervisor backed by `launchctl` and a user `LaunchAgents` plist.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{RestartPolicy, ServiceStatus, StartMode, SupervisorAdapter, SupervisorError, UnitSpec};

fn default_agents_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join("Library/LaunchAgents")
}

pub struct LaunchdAdapter {
    agents_dir: PathBuf,
}

impl Default for LaunchdAdapter {
    fn default() -> Self {
        Self::new(default_agents_dir())
    }
}

impl LaunchdAdapter {
    pub fn new(agents_dir: PathBuf) -> Self {
        Self { agents_dir }
    }

    fn plist_path(&self, label: &str) -> PathBuf {
        self.agents_dir.join(format!("{label}.plist"))
    }

    fn render_plist(label: &str, spec: &UnitSpec) -> String {
        let args = spec
            .exec_start
            .iter()
            .map(|arg| format!("        <string>{arg}</string>"))
            .collect::<Vec<_>>()
            .join("\n");

        let env = spec
            .environment
            .iter()
            .map(|(k, v)| format!("        <key>{k}</key>\n        <string>{v}</string>"))
            .collect::<Vec<_>>()
            .join("\n");

        let keep_alive = matches!(spec.restart, RestartPolicy::Always);

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<plist version=\"1.0\">\n\
<dict>\n\
    <key>Label</key>\n\
    <string>{label}</string>\n\
    <key>ProgramArguments</key>\n\
    <array>\n{args}\n    </array>\n\
    <key>EnvironmentVariables</key>\n\
    <dict>\n{env}\n    </dict>\n\
    <key>KeepAlive</key>\n\
    <{keep_alive}/>\n\
    <key>RunAtLoad</key>\n\
    <false/>\n\
</dict>\n\
</plist>\n"
        )
    }
}

#[async_trait]
impl SupervisorAdapter for LaunchdAdapter {
    async fn install(&self, spec: &UnitSpec) -> Result<(), SupervisorError> {
        tokio::fs::create_dir_all(&self.agents_dir).await?;
        let contents = Self::render_plist(&spec.name, spec);
        tokio::fs::write(self.plist_path(&spec.name), contents).await?;
        Ok(())
    }

    async fn start(&self, name: &str, mode: StartMode) -> Result<(), SupervisorError> {
        let path = self.plist_path(name);
        let output = Command::new("launchctl").arg("load").arg(&path).output().await?;
        if mode == StartMode::Blocking {
            let _ = self.is_active(name).await;
        }
        if !output.status.success() {
            return Err(SupervisorError::Start(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<(), SupervisorError> {
        let path = self.plist_path(name);
        let output = Command::new("launchctl").arg("unload").arg(&path).output().await?;
        if !output.status.success() {
            return Err(SupervisorError::Stop(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(())
    }

    async fn disable(&self, name: &str, now: bool) -> Result<(), SupervisorError> {
        if now {
            self.stop(name).await.ok();
        }
        Ok(())
    }

    async fn uninstall(&self, name: &str) -> Result<(), SupervisorError> {
        self.stop(name).await.ok();
        let path = self.plist_path(name);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn is_active(&self, name: &str) -> Result<bool, SupervisorError> {
        Ok(self.status(name).await?.is_active())
    }

    async fn status(&self, name: &str) -> Result<ServiceStatus, SupervisorError> {
        let output = Command::new("launchctl").arg("list").arg(name).output().await?;
        if !output.status.success() {
            return Ok(ServiceStatus::Unknown);
        }
        Ok(ServiceStatus::Active)
    }

    fn is_unknown_service_error(&self, err: &SupervisorError) -> bool {
        matches!(err, SupervisorError::UnitNotFound(_))
    }
}

#[cfg(test)]
#[path = "launchd_tests.rs"]
mod tests;
