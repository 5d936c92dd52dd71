// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::record::{FailureCategory, TaskIdentity, Tier};
use chrono::NaiveTime;
use std::collections::HashMap;
use std::io::Write;

const FULL: &str = r#"
[policy]
retry_ceiling = 3
blocklist = ["finance_daily.load_ledger"]
allowlist_dags = ["gold_sales_daily"]
window = { start = "01:00", end = "05:00" }

[limits]
max_log_bytes = 1024
max_excerpt_chars = 80

[[classifier.rule]]
pattern = "quota exceeded"
category = "compute_job_failure"
confidence = 0.95
transient = true

[daemon]
log_path = "/tmp/pdd.log"
"#;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn loads_every_section() {
    let file = write_config(FULL);
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.policy.retry_ceiling, 3);
    assert!(config
        .policy
        .blocklist
        .contains(&TaskIdentity::new("finance_daily", "load_ledger")));
    assert_eq!(
        config.policy.allowlist_dags,
        Some(["gold_sales_daily".to_string()].into_iter().collect())
    );
    let window = config.policy.window.unwrap();
    assert_eq!(window.start, NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    assert_eq!(config.limits.max_log_bytes, 1024);
    assert_eq!(config.limits.max_excerpt_chars, 80);
    assert_eq!(
        config.limits.max_request_bytes,
        Limits::default().max_request_bytes
    );
    assert_eq!(config.classifier.rules.len(), 1);
    assert!(config.classifier.rules[0].transient);
    assert_eq!(
        config.daemon.log_path.as_deref(),
        Some(Path::new("/tmp/pdd.log"))
    );
}

#[test]
fn empty_file_is_all_defaults() {
    let file = write_config("");
    assert_eq!(Config::load(file.path()).unwrap(), Config::default());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn unknown_section_is_rejected() {
    let file = write_config("[polcy]\nretry_ceiling = 1\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
}

#[test]
fn bad_window_time_is_rejected() {
    let file = write_config("[policy]\nwindow = { start = \"25:00\", end = \"05:00\" }\n");
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::Toml { .. })
    ));
}

#[test]
fn configured_rules_take_part_in_classification() {
    let file = write_config(FULL);
    let rules = Config::load(file.path()).unwrap().build_rules().unwrap();
    let record = rules.classify("job failed: Quota Exceeded for project", Tier::Compute);

    assert_eq!(record.category, FailureCategory::ComputeJobFailure);
    assert!(record.transient);
    assert!(record.source_excerpt.chars().count() <= 80 + "......".len());
}

#[test]
fn invalid_configured_rule_is_a_rules_error() {
    let file = write_config(
        "[[classifier.rule]]\npattern = \"(unclosed\"\ncategory = \"timeout\"\nconfidence = 0.9\n",
    );
    let err = Config::load(file.path()).unwrap().build_rules().unwrap_err();
    assert!(matches!(err, ConfigError::Rules(_)));
}

#[test]
fn env_overrides_policy() {
    let env = HashMap::from([
        (RETRY_CEILING_ENV, "5".to_string()),
        (ALLOWLIST_ENV, " bronze_ingest, gold_sales_daily ,".to_string()),
    ]);
    let config = Config::default()
        .with_env_overrides(|var| env.get(var).cloned())
        .unwrap();

    assert_eq!(config.policy.retry_ceiling, 5);
    let allow = config.policy.allowlist_dags.unwrap();
    assert_eq!(allow.len(), 2);
    assert!(allow.contains("bronze_ingest"));
}

#[test]
fn bad_retry_ceiling_env_is_rejected() {
    let err = Config::default()
        .with_env_overrides(|var| (var == RETRY_CEILING_ENV).then(|| "many".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains(RETRY_CEILING_ENV));
}

#[test]
fn no_env_leaves_config_alone() {
    let config = Config::default().with_env_overrides(no_env).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn discover_prefers_explicit_path() {
    let file = write_config("[policy]\nretry_ceiling = 7\n");
    let config = Config::discover(Some(file.path())).unwrap();
    assert_eq!(config.policy.retry_ceiling, 7);
}
