// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment configuration (`pd.toml`)

use crate::classify::{RuleError, RuleSet, RuleSpec, DEFAULT_EXCERPT_CHARS};
use crate::policy::PolicyConfig;
use crate::rca::{Synthesizer, DEFAULT_COMPUTE_OUTPUT_CHARS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "PD_CONFIG";
/// Overrides `policy.retry_ceiling`
pub const RETRY_CEILING_ENV: &str = "PD_RETRY_CEILING";
/// Overrides `policy.allowlist_dags` (comma separated)
pub const ALLOWLIST_ENV: &str = "PD_ALLOWLIST_DAGS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid classifier rules: {0}")]
    Rules(#[from] RuleError),
    #[error("invalid {var}: {message}")]
    Env { var: &'static str, message: String },
}

/// Size bounds applied to text crossing the tool boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_log_bytes: usize,
    pub max_excerpt_chars: usize,
    pub max_compute_output_chars: usize,
    pub max_request_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_log_bytes: 64 * 1024,
            max_excerpt_chars: DEFAULT_EXCERPT_CHARS,
            max_compute_output_chars: DEFAULT_COMPUTE_OUTPUT_CHARS,
            max_request_bytes: 1024 * 1024,
        }
    }
}

/// Extra classification rules, merged into the built-in list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    #[serde(rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Where `pdd` writes its log; stdout carries the protocol
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub policy: PolicyConfig,
    pub limits: Limits,
    pub classifier: ClassifierConfig,
    pub daemon: DaemonConfig,
}

impl Config {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit`, else `PD_CONFIG`, else defaults; then apply
    /// environment overrides.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)?
            }
            None => Self::default(),
        };
        config.with_env_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `PD_RETRY_CEILING` / `PD_ALLOWLIST_DAGS` as read by `lookup`
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(RETRY_CEILING_ENV) {
            self.policy.retry_ceiling = raw.trim().parse().map_err(|_| ConfigError::Env {
                var: RETRY_CEILING_ENV,
                message: format!("expected a non-negative integer, got {:?}", raw),
            })?;
        }
        if let Some(raw) = lookup(ALLOWLIST_ENV) {
            self.policy.allowlist_dags = Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|dag| !dag.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        Ok(self)
    }

    /// Built-in rules merged with `[[classifier.rule]]` entries
    pub fn build_rules(&self) -> Result<RuleSet, ConfigError> {
        let rules = if self.classifier.rules.is_empty() {
            RuleSet::default()
        } else {
            RuleSet::with_extra_rules(self.classifier.rules.clone())?
        };
        Ok(rules.with_excerpt_chars(self.limits.max_excerpt_chars))
    }

    pub fn synthesizer(&self) -> Synthesizer {
        Synthesizer::with_limits(self.limits.max_compute_output_chars)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
