// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root-cause report synthesis
//!
//! Deterministic template composition keyed by failure category. The
//! wording never claims more than the evidence supports: a cause is only
//! "confirmed" when a specific signature matched and compute-tier output
//! backs it, and an unrecognized failure is reported as such.

use crate::record::{Certainty, FailureCategory, FailureRecord, RcaSummary, RunLink};
use crate::text::tail_chars;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Default bound on compute output copied into `details`
pub const DEFAULT_COMPUTE_OUTPUT_CHARS: usize = 2000;

/// Minimum confidence for "confirmed" wording
pub const CONFIRMED_CONFIDENCE: f64 = 0.9;

/// Text templates for one category
struct Templates {
    root_cause: &'static str,
    impact: &'static str,
    suggested_fix: &'static str,
}

fn templates(category: FailureCategory) -> Templates {
    match category {
        FailureCategory::UpstreamDataMissing => Templates {
            root_cause: "input data expected by task {task_id} was not present when it ran",
            impact: "Task {task_id} in run {run_id} produced no output; downstream tables for this run are stale.",
            suggested_fix: "Confirm the upstream load for this run landed, then rerun {task_id}. If the upstream is late, add or tighten a sensor.",
        },
        FailureCategory::SchemaDrift => Templates {
            root_cause: "the schema of an input changed and no longer matches what task {task_id} expects",
            impact: "Task {task_id} in run {run_id} stopped before writing; data that did load may follow the new schema.",
            suggested_fix: "Check upstream schema changes. Update column usage in the dependent silver/gold transformations before rerunning.",
        },
        FailureCategory::DataQualityViolation => Templates {
            root_cause: "a data quality check rejected rows processed by task {task_id}",
            impact: "Task {task_id} in run {run_id} refused to publish; the target keeps the previous good data.",
            suggested_fix: "Check for null primary keys or constraint violations in the offending input and correct the source data.",
        },
        FailureCategory::ComputeJobFailure => Templates {
            root_cause: "compute run {compute_run_id} submitted by task {task_id} failed on the cluster",
            impact: "Task {task_id} in run {run_id} failed because its compute job did not finish.",
            suggested_fix: "Inspect the compute run {compute_run_id} for the failing stage. Transient platform errors can be retried; others need a code or configuration fix.",
        },
        FailureCategory::OutOfMemory => Templates {
            root_cause: "compute run {compute_run_id} for task {task_id} ran out of memory",
            impact: "Task {task_id} in run {run_id} failed; rerunning with the same resources will likely fail again.",
            suggested_fix: "Increase cluster memory (scale up) or improve partitioning (repartition) before rerunning.",
        },
        FailureCategory::DependencyFailure => Templates {
            root_cause: "a dependency of task {task_id} did not complete successfully",
            impact: "Task {task_id} in run {run_id} never executed its own work.",
            suggested_fix: "Resolve the failed upstream task, then clear {task_id} so the scheduler re-evaluates its dependencies.",
        },
        FailureCategory::PermissionDenied => Templates {
            root_cause: "task {task_id} was denied access to a resource it needs",
            impact: "Task {task_id} in run {run_id} failed and will keep failing until access is restored.",
            suggested_fix: "Check the service principal's IAM roles and grants on the resource named in the error.",
        },
        FailureCategory::Timeout => Templates {
            root_cause: "task {task_id} exceeded its time limit",
            impact: "Task {task_id} in run {run_id} was stopped before completing.",
            suggested_fix: "Check network connectivity and cluster availability, or increase the timeout if the workload grew.",
        },
        FailureCategory::Unknown => Templates {
            root_cause: "Automated classification did not recognize the failure signature for task {task_id}.",
            impact: "Task {task_id} in run {run_id} failed for a reason that could not be determined automatically.",
            suggested_fix: "Inspect the scheduler and compute logs manually; no automated fix is recommended.",
        },
    }
}

/// Builds [`RcaSummary`] reports
#[derive(Debug, Clone)]
pub struct Synthesizer {
    max_compute_output_chars: usize,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            max_compute_output_chars: DEFAULT_COMPUTE_OUTPUT_CHARS,
        }
    }
}

impl Synthesizer {
    pub fn with_limits(max_compute_output_chars: usize) -> Self {
        Self {
            max_compute_output_chars,
        }
    }

    /// Compose a report from a classified failure and its run link.
    ///
    /// `compute_output` is optional; its absence is stated in the report and
    /// lowers the certainty wording.
    pub fn synthesize(
        &self,
        record: &FailureRecord,
        link: &RunLink,
        compute_output: Option<&str>,
    ) -> RcaSummary {
        let compute_output = compute_output.filter(|o| !o.trim().is_empty());
        let templates = templates(record.category);
        let vars = ReportVars::new(record, link);

        let certainty = if record.is_unknown() {
            Certainty::Unrecognized
        } else if compute_output.is_some() && record.confidence >= CONFIRMED_CONFIDENCE {
            Certainty::Confirmed
        } else {
            Certainty::Likely
        };

        let cause = vars.fill(templates.root_cause);
        let root_cause = match certainty {
            Certainty::Confirmed => format!("Confirmed {}: {}.", record.category, cause),
            Certainty::Likely => format!("Likely {}: {}.", record.category, cause),
            Certainty::Unrecognized => cause,
        };

        let details = self.details(record, link, compute_output);

        tracing::debug!(
            category = %record.category,
            ?certainty,
            linked = link.is_linked(),
            "synthesized rca"
        );

        RcaSummary {
            root_cause,
            details,
            impact: vars.fill(templates.impact),
            suggested_fix: vars.fill(templates.suggested_fix),
            certainty,
            evidence: record.clone(),
            link: link.clone(),
        }
    }

    fn details(
        &self,
        record: &FailureRecord,
        link: &RunLink,
        compute_output: Option<&str>,
    ) -> String {
        let mut details = if record.is_unknown() {
            format!("No rule matched the {} log.", record.tier)
        } else {
            format!(
                "Matched {} signature /{}/ in {} log (confidence {:.2}).",
                record.category, record.matched_pattern, record.tier, record.confidence
            )
        };

        if !record.source_excerpt.is_empty() {
            details.push_str("\nExcerpt: ");
            details.push_str(&record.source_excerpt);
        }

        match (compute_output, &link.compute_run_id) {
            (Some(output), run_id) => {
                let label = run_id.as_deref().unwrap_or("unlinked");
                details.push_str(&format!("\n--- Compute output (run {}) ---\n", label));
                details.push_str(&tail_chars(output, self.max_compute_output_chars));
            }
            (None, Some(run_id)) => details.push_str(&format!(
                "\nCompute-tier evidence was unavailable for run {}; diagnosis is based on scheduler log text only.",
                run_id
            )),
            (None, None) => details.push_str(
                "\nCompute-tier evidence was unavailable: no compute run could be correlated from the scheduler log.",
            ),
        }
        details
    }
}

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("constant regex pattern is valid"));

/// Values substituted into category templates
struct ReportVars {
    task_id: String,
    run_id: String,
    compute_run_id: String,
    pattern: String,
}

impl ReportVars {
    fn new(record: &FailureRecord, link: &RunLink) -> Self {
        let or_unknown = |s: &str| {
            if s.is_empty() {
                "(unknown)".to_string()
            } else {
                s.to_string()
            }
        };
        Self {
            task_id: or_unknown(&link.scheduler_task_id),
            run_id: or_unknown(&link.scheduler_run_id),
            compute_run_id: link
                .compute_run_id
                .clone()
                .unwrap_or_else(|| "(not correlated)".to_string()),
            pattern: record.matched_pattern.clone(),
        }
    }

    /// Replace `{task_id}`, `{run_id}`, `{compute_run_id}` and `{pattern}`.
    /// Other placeholders stay in the text; values are not re-expanded.
    fn fill(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match &caps[1] {
                "task_id" => self.task_id.clone(),
                "run_id" => self.run_id.clone(),
                "compute_run_id" => self.compute_run_id.clone(),
                "pattern" => self.pattern.clone(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Synthesize with default limits
pub fn synthesize(
    record: &FailureRecord,
    link: &RunLink,
    compute_output: Option<&str>,
) -> RcaSummary {
    Synthesizer::default().synthesize(record, link, compute_output)
}

#[cfg(test)]
#[path = "rca_tests.rs"]
mod tests;
