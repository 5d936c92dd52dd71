// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline Doctor Daemon (pdd)
//!
//! Tool server speaking newline-delimited JSON on stdin/stdout. Logs go to
//! a file because stdout carries the protocol.

use std::path::PathBuf;
use std::sync::Arc;

use pd_daemon::lifecycle::{self, DaemonConfig, LifecycleError};
use pd_daemon::serve;
use tokio::io::BufReader;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// What the command line asked for
enum Invocation {
    Serve { config: Option<PathBuf> },
    Version,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Invocation, String> {
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            "--version" => return Ok(Invocation::Version),
            other => return Err(format!("unexpected argument: {}", other)),
        }
    }
    Ok(Invocation::Serve { config })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match parse_args(std::env::args().skip(1))? {
        Invocation::Version => {
            println!("pdd {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Invocation::Serve { config } => config,
    };

    let config = DaemonConfig::load(config_path.as_deref())?;

    // The marker goes in before tracing starts so each run is easy to find
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent).map_err(LifecycleError::from)?;
    }
    append_log_line(
        &config,
        &format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id()),
    )?;

    let log_guard = setup_logging(&config)?;

    let tools = match lifecycle::startup(&config) {
        Ok(tools) => Arc::new(tools),
        Err(e) => {
            // Tracing is non-blocking and may not flush before exit
            let _ = append_log_line(&config, &format!("ERROR Failed to start daemon: {}", e));
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready, serving tools on stdio");

    let max_request_bytes = config.config.limits.max_request_bytes;
    let server = serve(
        tools,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        max_request_bytes,
    );

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
            info!("Input closed, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
        }
    }

    info!("Daemon stopped");
    Ok(())
}

/// Full marker: "--- pdd: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- pdd: starting (pid: ";

fn append_log_line(config: &DaemonConfig, line: &str) -> Result<(), LifecycleError> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}
