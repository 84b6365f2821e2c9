// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection strategy (C5): how the front-end gets from "nothing running"
//! (or "something already running") to a dialed [`ClientHandle`]. Three
//! variants correspond to the CLI's three entry points: starting a fresh
//! install, resuming an in-flight one, and attaching as an observer without
//! disturbing whatever's already there.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_supervisor::{StartMode, SupervisorAdapter, SupervisorError, UnitSpec};
use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::time::sleep;

use crate::client::ClientHandle;

const DIAL_BACKOFF_CAP: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("host is not ready for a fresh install: {0}")]
    HostInvalid(String),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("{0} — run `agentctl install` to start over")]
    DialFailed(String),

    #[error("timed out dialing the worker after {0:?}")]
    Timeout(Duration),
}

/// What a connection strategy needs regardless of which variant it is.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub socket_path: PathBuf,
    pub service_name: String,
    pub connect_timeout: Duration,
}

/// Common surface all three strategies expose: a way to dial, and the
/// supervisor unit name the client runtime polls during shutdown-wait.
#[async_trait]
pub trait ConnectionStrategy: Send + Sync {
    async fn connect(&self) -> Result<ClientHandle, StrategyError>;
    fn service_name(&self) -> &str;
}

/// Validates the host, installs and starts the worker unit fresh, and dials
/// until the socket answers. Rolls the unit back out on any failure after
/// install, so a retry starts clean.
pub struct InstallerStrategy<S> {
    pub supervisor: Arc<S>,
    pub config: ConnectConfig,
    pub unit_spec: UnitSpec,
    pub host_precondition: Box<dyn Fn() -> Result<(), String> + Send + Sync>,
}

#[async_trait]
impl<S: SupervisorAdapter> ConnectionStrategy for InstallerStrategy<S> {
    async fn connect(&self) -> Result<ClientHandle, StrategyError> {
        (self.host_precondition)().map_err(StrategyError::HostInvalid)?;

        self.supervisor.install(&self.unit_spec).await?;

        if let Err(e) = self.supervisor.start(&self.unit_spec.name, StartMode::NonBlocking).await {
            self.supervisor.uninstall(&self.unit_spec.name).await.ok();
            return Err(e.into());
        }

        match dial_with_retry(&self.config.socket_path, self.config.connect_timeout).await {
            Ok(()) => Ok(ClientHandle::new(self.config.socket_path.clone(), self.config.service_name.clone())),
            Err(e) => {
                self.supervisor.uninstall(&self.unit_spec.name).await.ok();
                Err(e)
            }
        }
    }

    fn service_name(&self) -> &str {
        &self.config.service_name
    }
}

/// Expects the unit to already exist; starting it is idempotent if it's
/// already active. Fails fast (no uninstall, no retry loop) with a hint to
/// run `install` instead, since a missing unit isn't something resuming can
/// fix.
pub struct ResumeStrategy<S> {
    pub supervisor: Arc<S>,
    pub config: ConnectConfig,
}

#[async_trait]
impl<S: SupervisorAdapter> ConnectionStrategy for ResumeStrategy<S> {
    async fn connect(&self) -> Result<ClientHandle, StrategyError> {
        if let Err(e) = self.supervisor.start(&self.config.service_name, StartMode::Blocking).await {
            if self.supervisor.is_unknown_service_error(&e) {
                return Err(StrategyError::DialFailed(format!("worker unit {} not found", self.config.service_name)));
            }
            return Err(e.into());
        }

        match dial_with_retry(&self.config.socket_path, self.config.connect_timeout).await {
            Ok(()) => Ok(ClientHandle::new(self.config.socket_path.clone(), self.config.service_name.clone())),
            Err(e) => Err(e),
        }
    }

    fn service_name(&self) -> &str {
        &self.config.service_name
    }
}

/// Attaches to whatever worker may already be running, starting it as a
/// best-effort no-op if it isn't, without validating host state or rolling
/// anything back on failure.
pub struct ObserverStrategy<S> {
    pub supervisor: Arc<S>,
    pub config: ConnectConfig,
}

#[async_trait]
impl<S: SupervisorAdapter> ConnectionStrategy for ObserverStrategy<S> {
    async fn connect(&self) -> Result<ClientHandle, StrategyError> {
        let active = self.supervisor.is_active(&self.config.service_name).await.unwrap_or(false);
        if !active {
            self.supervisor.start(&self.config.service_name, StartMode::NonBlocking).await.ok();
        }
        dial_with_retry(&self.config.socket_path, self.config.connect_timeout).await?;
        Ok(ClientHandle::new(self.config.socket_path.clone(), self.config.service_name.clone()))
    }

    fn service_name(&self) -> &str {
        &self.config.service_name
    }
}

/// Dials `socket_path` with exponential backoff (capped) until it answers or
/// `timeout` elapses.
async fn dial_with_retry(socket_path: &Path, timeout: Duration) -> Result<(), StrategyError> {
    let deadline = Instant::now() + timeout;
    let mut backoff = Duration::from_millis(20);

    loop {
        if UnixStream::connect(socket_path).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(StrategyError::Timeout(timeout));
        }
        sleep(backoff.min(DIAL_BACKOFF_CAP)).await;
        backoff = (backoff * 2).min(DIAL_BACKOFF_CAP);
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
