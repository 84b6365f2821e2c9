// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{RestartPolicy, ServiceStatus, StartMode, SupervisorAdapter, SupervisorError, UnitSpec};

fn default_unit_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("systemd")
        .join("user")
}

/// Supervisor adapter backed by `systemctl --user`.
///
/// Installs the unit as a plain `.service` file under the user's systemd
/// unit directory rather than going through `systemd-run`, so the unit
/// survives the installing process and is inspectable with `systemctl
/// --user cat`.
pub struct SystemdUserAdapter {
    unit_dir: PathBuf,
}

impl Default for SystemdUserAdapter {
    fn default() -> Self {
        Self::new(default_unit_dir())
    }
}

impl SystemdUserAdapter {
    pub fn new(unit_dir: PathBuf) -> Self {
        Self { unit_dir }
    }

    fn unit_path(&self, name: &str) -> PathBuf {
        if Path::new(name).is_absolute() {
            PathBuf::from(name)
        } else {
            self.unit_dir.join(name)
        }
    }

    fn unit_name(&self, name: &str) -> String {
        Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string())
    }

    fn render_unit_file(spec: &UnitSpec) -> String {
        let mut out = String::new();
        out.push_str("[Unit]\n");
        out.push_str("Description=installer agent worker\n\n");

        out.push_str("[Service]\n");
        for cmd in &spec.pre_start {
            out.push_str(&format!("ExecStartPre={}\n", shell_join(cmd)));
        }
        out.push_str(&format!("ExecStart={}\n", shell_join(&spec.exec_start)));
        if let Some(dir) = &spec.working_directory {
            out.push_str(&format!("WorkingDirectory={}\n", dir.display()));
        }
        for (key, value) in &spec.environment {
            out.push_str(&format!("Environment=\"{key}={value}\"\n"));
        }
        match spec.restart {
            RestartPolicy::Always => out.push_str("Restart=always\n"),
            RestartPolicy::Never => out.push_str("Restart=no\n"),
        }
        if !spec.no_restart_exit_codes.is_empty() {
            out.push_str(&format!(
                "RestartPreventExitStatus={}\n",
                join_codes(&spec.no_restart_exit_codes)
            ));
        }
        if !spec.success_exit_codes.is_empty() {
            out.push_str(&format!("SuccessExitStatus={}\n", join_codes(&spec.success_exit_codes)));
        }
        out.push('\n');

        out.push_str("[Install]\n");
        out.push_str(&format!("WantedBy={}\n", spec.wanted_by));
        out
    }

    async fn systemctl(&self, args: &[&str]) -> Result<std::process::Output, SupervisorError> {
        debug!(args = ?args, "systemctl --user");
        Command::new("systemctl")
            .arg("--user")
            .args(args)
            .output()
            .await
            .map_err(SupervisorError::Io)
    }
}

fn shell_join(argv: &[String]) -> String {
    argv.join(" ")
}

fn join_codes(codes: &[i32]) -> String {
    codes.iter().map(i32::to_string).collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl SupervisorAdapter for SystemdUserAdapter {
    async fn install(&self, spec: &UnitSpec) -> Result<(), SupervisorError> {
        tokio::fs::create_dir_all(&self.unit_dir).await?;
        let path = self.unit_path(&spec.name);
        let contents = Self::render_unit_file(spec);
        tokio::fs::write(&path, contents).await?;

        let output = self.systemctl(&["daemon-reload"]).await?;
        if !output.status.success() {
            return Err(SupervisorError::Install(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(())
    }

    async fn start(&self, name: &str, mode: StartMode) -> Result<(), SupervisorError> {
        let unit = self.unit_name(name);
        let mut args = vec!["start"];
        if mode == StartMode::NonBlocking {
            args.insert(0, "--no-block");
        }
        args.push(&unit);
        let output = self.systemctl(&args).await?;
        if !output.status.success() {
            return Err(translate_systemctl_error(&output.stderr, "start failed"));
        }
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<(), SupervisorError> {
        let unit = self.unit_name(name);
        let output = self.systemctl(&["stop", &unit]).await?;
        if !output.status.success() {
            return Err(translate_systemctl_error(&output.stderr, "stop failed"));
        }
        Ok(())
    }

    async fn disable(&self, name: &str, now: bool) -> Result<(), SupervisorError> {
        let unit = self.unit_name(name);
        let mut args = vec!["disable"];
        if now {
            args.push("--now");
        }
        args.push(&unit);
        let output = self.systemctl(&args).await?;
        if !output.status.success() {
            warn!(unit = %unit, "systemctl disable failed, continuing");
        }
        Ok(())
    }

    async fn uninstall(&self, name: &str) -> Result<(), SupervisorError> {
        self.disable(name, true).await.ok();
        let path = self.unit_path(name);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        self.systemctl(&["daemon-reload"]).await?;
        Ok(())
    }

    async fn is_active(&self, name: &str) -> Result<bool, SupervisorError> {
        Ok(self.status(name).await?.is_active())
    }

    async fn status(&self, name: &str) -> Result<ServiceStatus, SupervisorError> {
        let unit = self.unit_name(name);
        let output = self.systemctl(&["is-active", &unit]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(match stdout.trim() {
            "active" => ServiceStatus::Active,
            "inactive" => ServiceStatus::Inactive,
            "failed" => ServiceStatus::Failed,
            "activating" => ServiceStatus::Activating,
            "deactivating" => ServiceStatus::Deactivating,
            _ => ServiceStatus::Unknown,
        })
    }

    fn is_unknown_service_error(&self, err: &SupervisorError) -> bool {
        matches!(err, SupervisorError::UnitNotFound(_))
    }
}

fn translate_systemctl_error(stderr: &[u8], context: &str) -> SupervisorError {
    let message = String::from_utf8_lossy(stderr);
    if message.contains("not found") || message.contains("No such") {
        SupervisorError::UnitNotFound(message.into_owned())
    } else {
        SupervisorError::Start(format!("{context}: {message}"))
    }
}

#[cfg(test)]
#[path = "systemd_tests.rs"]
mod tests;
