// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pd - Pipeline Doctor CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, tools};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::error::PdError;
use crate::output::OutputFormat;
use pd_core::Config;

#[derive(Parser)]
#[command(
    name = "pd",
    version,
    about = "Pipeline Doctor - diagnose failed data pipeline runs"
)]
struct Cli {
    /// Config file (defaults to $PD_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a failure log
    Classify(analyze::ClassifyArgs),
    /// Find the compute run referenced by a scheduler log
    Correlate(analyze::CorrelateArgs),
    /// Build a root-cause report from a task log
    Rca(analyze::RcaArgs),
    /// Decide whether a failed task may be remediated automatically
    Decide(analyze::DecideArgs),
    /// Call a tool the way pdd serves it
    Call(tools::CallArgs),
    /// List the tools pdd serves
    Tools,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PdError>() {
                Some(pd_error) => eprint!("{}", pd_error),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref()).map_err(PdError::config_invalid)?;
    let format = cli.format;

    match cli.command {
        Commands::Classify(args) => analyze::classify(args, &config, format),
        Commands::Correlate(args) => analyze::correlate(args, &config, format),
        Commands::Rca(args) => analyze::rca(args, &config, format),
        Commands::Decide(args) => analyze::decide(args, &config, format),
        Commands::Call(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(tools::call(args, &config, format))
        }
        Commands::Tools => {
            tools::list(format);
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
