// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentctl: drives the `agentd` worker through one of three connection
//! strategies, streams its progress to the terminal, and applies the
//! lifecycle policy once the operation reaches a terminal state.

use std::path::PathBuf;
use std::sync::Arc;

use agent_cli::client::ClientHandle;
use agent_cli::config;
use agent_cli::exit_error::ExitError;
use agent_cli::interrupt::InterruptHandler;
use agent_cli::lifecycle::{AutomaticPolicy, DebugReporter, LifecyclePolicy};
use agent_cli::runtime::{ClientRuntime, StdoutPrinter};
use agent_cli::strategy::{ConnectConfig, ConnectionStrategy, InstallerStrategy, ObserverStrategy, ResumeStrategy};
use agent_core::{CoreError, OperationKey, Phase};
use agent_supervisor::{RestartPolicy, SystemdUserAdapter, UnitSpec};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentctl", about = "Drive a cluster install through the agentd worker", version)]
struct Cli {
    #[arg(long)]
    account_id: String,

    #[arg(long)]
    cluster_name: String,

    #[arg(long)]
    operation_id: String,

    /// Where to write a debug report if the operation ends in error.
    #[arg(long)]
    debug_report_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a fresh install: validates the host, installs and starts the
    /// worker unit, then drives the whole plan.
    Install {
        #[arg(long)]
        force: bool,
    },
    /// Attach to an in-flight operation, starting the worker unit if it
    /// isn't already running, and drive the whole plan.
    Resume,
    /// Attach to whatever worker may already be running without validating
    /// host state or taking ownership of its lifecycle.
    Observe,
    /// Execute or roll back a single phase of an in-flight plan.
    Phase {
        #[command(subcommand)]
        action: PhaseAction,
    },
    /// Report whether a worker for this operation is running.
    Status,
    /// Tail the worker's log file.
    Logs {
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
    },
    /// Request that an in-flight operation cancel.
    Abort,
    /// Mark a `CompletedPending` operation completed and shut the worker
    /// down.
    Complete,
}

#[derive(Subcommand)]
enum PhaseAction {
    Execute {
        phase_id: String,
        #[arg(long)]
        force: bool,
    },
    Rollback {
        phase_id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("agentctl: {e}");
            std::process::exit(e.code);
        }
    }
}

async fn run() -> Result<(), ExitError> {
    let cli = Cli::parse();
    let key = OperationKey::new(cli.account_id.clone(), cli.cluster_name.clone(), cli.operation_id.clone());

    match cli.command {
        Command::Install { force } => run_plan(&key, cli.debug_report_path, force, Strategy::Install, None).await,
        Command::Resume => run_plan(&key, cli.debug_report_path, false, Strategy::Resume, None).await,
        Command::Observe => run_plan(&key, cli.debug_report_path, false, Strategy::Observe, None).await,
        Command::Phase { action } => {
            let phase = match action {
                PhaseAction::Execute { phase_id, force } => Phase { key: key.clone(), id: phase_id, force, rollback: false },
                PhaseAction::Rollback { phase_id } => Phase { key: key.clone(), id: phase_id, force: false, rollback: true },
            };
            let rollback = phase.rollback;
            run_plan(&key, cli.debug_report_path, false, Strategy::Resume, Some((phase, rollback))).await
        }
        Command::Status => status(&key).await,
        Command::Logs { limit } => logs(limit),
        Command::Abort => abort(&key).await,
        Command::Complete => complete(&key).await,
    }
}

enum Strategy {
    Install,
    Resume,
    Observe,
}

async fn run_plan(
    key: &OperationKey,
    debug_report_path: Option<PathBuf>,
    force: bool,
    strategy: Strategy,
    phase: Option<(Phase, bool)>,
) -> Result<(), ExitError> {
    let connect_config = connect_config(key)?;
    let service_name = connect_config.service_name.clone();
    let supervisor = Arc::new(SystemdUserAdapter::default());

    let client = match strategy {
        Strategy::Install => {
            let unit_spec = unit_spec(key, &connect_config, force)?;
            let socket_path = connect_config.socket_path.clone();
            let strategy = InstallerStrategy {
                supervisor: Arc::clone(&supervisor),
                config: connect_config,
                unit_spec,
                host_precondition: Box::new(move || {
                    if socket_path.exists() {
                        Err(format!("a worker is already listening on {}", socket_path.display()))
                    } else {
                        Ok(())
                    }
                }),
            };
            strategy.connect().await?
        }
        Strategy::Resume => ResumeStrategy { supervisor: Arc::clone(&supervisor), config: connect_config }.connect().await?,
        Strategy::Observe => ObserverStrategy { supervisor: Arc::clone(&supervisor), config: connect_config }.connect().await?,
    };

    let aborter = Arc::new(ClientAborter { client: client.clone() });
    let (handler, handle) = InterruptHandler::spawn(config::cleanup_timeout());
    handler.add_aborter(Arc::clone(&aborter) as Arc<dyn agent_cli::interrupt::Aborter>);

    let runtime = ClientRuntime::new(client.clone(), Arc::new(StdoutPrinter));
    let (status, err) = match phase {
        None => runtime.run(&handle).await,
        Some((phase, false)) => runtime.execute_phase(phase, &handle).await,
        Some((phase, true)) => runtime.rollback_phase(phase, &handle).await,
    };

    let policy = LifecyclePolicy::Automatic(AutomaticPolicy {
        debug_report_path,
        completer: None,
        aborter: Some(aborter as Arc<dyn agent_cli::lifecycle::Aborter>),
        local_debug_reporter: Some(Arc::new(StderrDebugReporter) as Arc<dyn DebugReporter>),
        supervisor: Some(supervisor as Arc<dyn agent_supervisor::SupervisorAdapter>),
        service_name: Some(service_name),
        shutdown_wait_timeout: config::shutdown_wait_timeout(),
    });

    policy.handle_status(&client, status, err).await?;
    Ok(())
}

async fn status(key: &OperationKey) -> Result<(), ExitError> {
    let connect_config = connect_config(key)?;
    if !connect_config.socket_path.exists() {
        println!("worker not running");
        return Ok(());
    }
    let client = ClientHandle::new(connect_config.socket_path, connect_config.service_name);
    match client.status().await {
        Ok((active, uptime_secs)) => {
            println!("active: {active}");
            println!("uptime: {uptime_secs}s");
            Ok(())
        }
        Err(e) if e.is_server_unavailable() => {
            println!("worker not running");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn abort(key: &OperationKey) -> Result<(), ExitError> {
    let connect_config = connect_config(key)?;
    let client = ClientHandle::new(connect_config.socket_path, connect_config.service_name);
    client.abort().await?;
    println!("abort requested");
    Ok(())
}

async fn complete(key: &OperationKey) -> Result<(), ExitError> {
    let connect_config = connect_config(key)?;
    let service_name = connect_config.service_name.clone();
    let supervisor = Arc::new(SystemdUserAdapter::default());
    let client = ClientHandle::new(connect_config.socket_path, connect_config.service_name);

    let runtime = ClientRuntime::new(client.clone(), Arc::new(StdoutPrinter));
    let policy = LifecyclePolicy::Automatic(AutomaticPolicy {
        debug_report_path: None,
        completer: None,
        aborter: None,
        local_debug_reporter: None,
        supervisor: Some(supervisor as Arc<dyn agent_supervisor::SupervisorAdapter>),
        service_name: Some(service_name),
        shutdown_wait_timeout: config::shutdown_wait_timeout(),
    });

    runtime.complete(key.clone(), &policy).await?;
    println!("operation marked completed");
    Ok(())
}

fn logs(limit: usize) -> Result<(), ExitError> {
    let state_dir = config::state_dir().map_err(|e| ExitError::new(agent_core::EXIT_GENERIC_FAILURE, e.to_string()))?;
    let log_path = state_dir.join("agentd.log");
    let contents = std::fs::read_to_string(&log_path)
        .map_err(|e| ExitError::new(agent_core::EXIT_GENERIC_FAILURE, format!("reading {}: {e}", log_path.display())))?;
    for line in contents.lines().rev().take(limit).collect::<Vec<_>>().into_iter().rev() {
        println!("{line}");
    }
    Ok(())
}

fn connect_config(key: &OperationKey) -> Result<ConnectConfig, ExitError> {
    let socket_path =
        config::socket_path().map_err(|e| ExitError::new(agent_core::EXIT_GENERIC_FAILURE, e.to_string()))?;
    Ok(ConnectConfig { socket_path, service_name: config::service_name(key), connect_timeout: config::connect_timeout() })
}

fn unit_spec(key: &OperationKey, connect_config: &ConnectConfig, force: bool) -> Result<UnitSpec, ExitError> {
    let agentd_path = agentd_binary_path()?;
    let mut environment: std::collections::HashMap<String, String> =
        std::env::vars().filter(|(k, _)| k.starts_with("AGENTD_")).collect();
    environment.insert(
        "AGENTD_STATE_DIR".to_string(),
        connect_config.socket_path.parent().map(|p| p.display().to_string()).unwrap_or_default(),
    );

    let mut exec_start = vec![agentd_path.display().to_string()];
    if force {
        exec_start.push("--force".to_string());
    }
    let _ = key;

    let mut spec = UnitSpec::new(connect_config.service_name.clone(), exec_start);
    spec.environment = environment;
    spec.restart = RestartPolicy::Always;
    spec.no_restart_exit_codes = agent_core::no_restart_exit_codes().to_vec();
    spec.success_exit_codes = vec![agent_core::EXIT_COMPLETED, agent_core::EXIT_ABORTED];
    Ok(spec)
}

fn agentd_binary_path() -> Result<PathBuf, ExitError> {
    if let Ok(path) = std::env::var("AGENTD_BIN") {
        return Ok(PathBuf::from(path));
    }
    let current = std::env::current_exe()
        .map_err(|e| ExitError::new(agent_core::EXIT_GENERIC_FAILURE, format!("resolving current executable: {e}")))?;
    match current.parent() {
        Some(dir) => Ok(dir.join("agentd")),
        None => Ok(PathBuf::from("agentd")),
    }
}

struct ClientAborter {
    client: ClientHandle,
}

#[async_trait]
impl agent_cli::interrupt::Aborter for ClientAborter {
    async fn abort(&self) {
        if let Err(e) = self.client.abort().await {
            tracing::warn!(error = %e, "failed to request abort on interrupt");
        }
    }
}

#[async_trait]
impl agent_cli::lifecycle::Aborter for ClientAborter {
    async fn abort(&self) {
        if let Err(e) = self.client.abort().await {
            tracing::warn!(error = %e, "failed to request abort");
        }
    }
}

struct StderrDebugReporter;

#[async_trait]
impl DebugReporter for StderrDebugReporter {
    async fn report(&self, error: &CoreError) {
        eprintln!("agentctl: operation failed: {error}");
    }
}
