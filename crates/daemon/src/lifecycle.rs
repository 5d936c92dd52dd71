// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, log location, tool wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pd_adapters::{
    NoOpComputeAdapter, NoOpSchedulerAdapter, TracedComputeAdapter, TracedSchedulerAdapter,
};
use pd_core::{Config, ConfigError};
use thiserror::Error;
use tracing::info;

use crate::tools::ToolAdapter;

/// Tool adapter with the daemon's concrete platform adapters (wrapped with tracing)
pub type DaemonTools =
    ToolAdapter<TracedSchedulerAdapter<NoOpSchedulerAdapter>, TracedComputeAdapter<NoOpComputeAdapter>>;

/// Daemon settings resolved from `pd.toml` and the environment
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub config: Config,
    /// Path to daemon log file
    pub log_path: PathBuf,
}

impl DaemonConfig {
    /// Load config from `explicit`, `PD_CONFIG`, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, LifecycleError> {
        let config = Config::discover(explicit)?;
        let log_path = match &config.daemon.log_path {
            Some(path) => path.clone(),
            None => state_dir()?.join("pdd.log"),
        };
        Ok(Self { config, log_path })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the tool adapter from configuration
pub fn startup(config: &DaemonConfig) -> Result<DaemonTools, LifecycleError> {
    let rules = config.config.build_rules()?;
    info!(
        rules = rules.len(),
        retry_ceiling = config.config.policy.retry_ceiling,
        blocklist = config.config.policy.blocklist.len(),
        allowlist = ?config.config.policy.allowlist_dags,
        "tools configured"
    );

    Ok(ToolAdapter::new(
        TracedSchedulerAdapter::new(NoOpSchedulerAdapter::new()),
        TracedComputeAdapter::new(NoOpComputeAdapter::new()),
    )
    .with_rules(Arc::new(rules))
    .with_synthesizer(config.config.synthesizer())
    .with_policy(config.config.policy.clone())
    .with_limits(config.config.limits))
}

/// Get the state directory for pd
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // Use XDG_STATE_HOME or default to ~/.local/state
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("pd"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/pd"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
