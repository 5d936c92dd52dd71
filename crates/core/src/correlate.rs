// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler to compute run correlation
//!
//! Scheduler operators log the id of the compute run they submitted. When a
//! task retried within one attempt, several ids can appear; the last one is
//! the submission that actually failed.

use crate::record::RunLink;
use regex::Regex;
use std::sync::LazyLock;

// Each marker captures the run id in group 1
#[allow(clippy::expect_used)]
static MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // run_id=123, databricks_run_id: 123, Run ID 123
        r"(?i)run[_ ]id[=: ]+(\d+)",
        // "run_id": 123 inside a JSON response
        r#"(?i)"run_id"\s*:\s*"?(\d+)"#,
        // Submitted run 123 / Submitted run with id 123
        r"(?i)submitted run\D{0,32}?(\d+)",
        // Run page URL: https://host/#job/5/run/123
        r"(?i)/run/(\d+)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("constant regex pattern is valid"))
    .collect()
});

/// Extract the compute run id from scheduler log text.
///
/// Returns `None` when no marker is present. When several markers are
/// present the one whose id appears last in the text wins.
pub fn correlate(scheduler_log_text: &str) -> Option<String> {
    let found = MARKERS
        .iter()
        .flat_map(|re| re.captures_iter(scheduler_log_text))
        .filter_map(|caps| caps.get(1))
        .max_by_key(|m| m.start())
        .map(|m| m.as_str().to_string());

    match &found {
        Some(id) => tracing::debug!(compute_run_id = %id, "correlated compute run"),
        None => tracing::debug!("no compute run id in scheduler log"),
    }
    found
}

/// Build a [`RunLink`] for a scheduler task run from its log text
pub fn link_run(task_id: &str, run_id: &str, scheduler_log_text: &str) -> RunLink {
    RunLink::new(task_id, run_id).with_compute_run_id(correlate(scheduler_log_text))
}

#[cfg(test)]
#[path = "correlate_tests.rs"]
mod tests;
