// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agentd`: the long-lived worker process. Supervised by systemd or
//! launchd, started once per operation and left running across front-end
//! restarts until a client asks it to shut down (or it is signaled).

use std::sync::Arc;

use agent_worker::executor::UnimplementedExecutor;
use agent_worker::lifecycle::Config;
use agent_worker::{env, lifecycle, Server};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("agentd: {e}");
            std::process::exit(agent_core::EXIT_GENERIC_FAILURE);
        }
    };

    let _log_guard = init_logging(&config.log_path);

    let startup = match lifecycle::startup(config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            std::process::exit(agent_core::EXIT_GENERIC_FAILURE);
        }
    };

    let ipc_timeout = env::ipc_timeout();
    let drain_timeout = env::drain_timeout();
    let server = Arc::new(Server::new(Arc::new(UnimplementedExecutor), ipc_timeout));

    let accept_task = {
        let server = Arc::clone(&server);
        let listener = startup.listener;
        tokio::spawn(async move { server.run(listener).await })
    };

    tokio::select! {
        _ = server.notified() => {
            tracing::info!("shutdown requested over ipc");
        }
        () = wait_for_termination_signal() => {
            tracing::info!("shutdown requested by signal");
            server.abort();
            server.request_shutdown(Some(agent_core::EXIT_ABORTED), false);
        }
    }

    if tokio::time::timeout(drain_timeout, accept_task).await.is_err() {
        tracing::warn!("accept loop did not stop within the drain timeout");
    }

    startup.worker.shutdown();

    let code = server.exit_code().unwrap_or(agent_core::EXIT_GENERIC_FAILURE);
    std::process::exit(code);
}

/// Waits for either Ctrl-C or, on Unix, `SIGTERM`/`SIGQUIT` — whichever the
/// supervisor or an interactive session sends first.
async fn wait_for_termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::quit())) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                    _ = quit.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_logging(log_path: &std::path::Path) -> Option<WorkerGuard> {
    let directory = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("agentd.log"));
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).try_init();

    match result {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}
