// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remediation policy engine
//!
//! A pure decision function: given a classified failure and the context of
//! the task it belongs to, decide whether an automated clear or rerun may
//! proceed without a human. Every path that is not explicitly allowed is a
//! denial, so a category the rules do not know about never leads to an
//! automated action.

use crate::record::{
    FailureCategory, FailureRecord, PolicyDecision, RemediationAction, RiskTier, TaskIdentity,
    Tier,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default retry ceiling
pub const DEFAULT_RETRY_CEILING: u32 = 2;

/// Reason given when no rule allows the action
pub const DEFAULT_DENIAL: &str = "no matching policy rule; defaulting to safe denial.";

/// Time-of-day window in which automated remediation may run.
///
/// `start > end` describes a window that wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationWindow {
    #[serde(with = "time_of_day")]
    pub start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end: NaiveTime,
}

impl RemediationWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Start inclusive, end exclusive
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Blocklists are written as `dag_id.task_id` strings
mod identity_set {
    use crate::record::TaskIdentity;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeSet;

    pub fn serialize<S: Serializer>(set: &BTreeSet<TaskIdentity>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(set.iter().map(ToString::to_string))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<TaskIdentity>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|raw| raw.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Deployment-wide policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub retry_ceiling: u32,
    #[serde(with = "identity_set")]
    pub blocklist: BTreeSet<TaskIdentity>,
    /// When set, only these DAGs may be remediated. An empty set denies all.
    pub allowlist_dags: Option<BTreeSet<String>>,
    pub window: Option<RemediationWindow>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            retry_ceiling: DEFAULT_RETRY_CEILING,
            blocklist: BTreeSet::new(),
            allowlist_dags: None,
            window: None,
        }
    }
}

/// Everything one decision needs besides the failure itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyContext {
    pub category: FailureCategory,
    pub tier: Tier,
    /// Automated retries already performed for this task run
    pub retry_count: u32,
    pub retry_ceiling: u32,
    pub task_identity: TaskIdentity,
    #[serde(default, with = "identity_set")]
    pub blocklist: BTreeSet<TaskIdentity>,
    #[serde(default)]
    pub allowlist_dags: Option<BTreeSet<String>>,
    #[serde(default)]
    pub window: Option<RemediationWindow>,
    /// Time of day the action would run; required when a window is set
    #[serde(default)]
    pub now: Option<NaiveTime>,
}

impl PolicyContext {
    /// Context for `record` on `task_identity` using deployment settings
    pub fn new(record: &FailureRecord, task_identity: TaskIdentity, config: &PolicyConfig) -> Self {
        Self {
            category: record.category,
            tier: record.tier,
            retry_count: 0,
            retry_ceiling: config.retry_ceiling,
            task_identity,
            blocklist: config.blocklist.clone(),
            allowlist_dags: config.allowlist_dags.clone(),
            window: config.window,
            now: None,
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_retry_ceiling(mut self, retry_ceiling: u32) -> Self {
        self.retry_ceiling = retry_ceiling;
        self
    }

    pub fn with_blocklist(mut self, blocklist: BTreeSet<TaskIdentity>) -> Self {
        self.blocklist = blocklist;
        self
    }

    pub fn with_now(mut self, now: NaiveTime) -> Self {
        self.now = Some(now);
        self
    }
}

/// Risk of acting on a failure, reported on every decision
pub fn risk_tier(record: &FailureRecord) -> RiskTier {
    risk_for(record.category, record.tier, record.transient)
}

fn risk_for(category: FailureCategory, tier: Tier, transient: bool) -> RiskTier {
    let base = match category {
        FailureCategory::SchemaDrift
        | FailureCategory::DataQualityViolation
        | FailureCategory::PermissionDenied
        | FailureCategory::Unknown => return RiskTier::High,
        FailureCategory::UpstreamDataMissing | FailureCategory::OutOfMemory => RiskTier::Medium,
        FailureCategory::ComputeJobFailure if !transient => RiskTier::Medium,
        FailureCategory::ComputeJobFailure
        | FailureCategory::Timeout
        | FailureCategory::DependencyFailure => RiskTier::Low,
    };
    // Reruns on the compute tier cost cluster time
    match tier {
        Tier::Compute if base == RiskTier::Low => base.raised(),
        _ => base,
    }
}

/// Decide whether automated remediation is allowed.
///
/// Total and deterministic: the same inputs always give the same decision.
/// Category and tier come from `ctx` (copied from the record by
/// [`PolicyContext::new`]); `record` supplies the `transient` flag.
pub fn decide(record: &FailureRecord, ctx: &PolicyContext) -> PolicyDecision {
    let decision = evaluate(record, ctx);
    tracing::debug!(
        task = %ctx.task_identity,
        category = %ctx.category,
        allowed = decision.allowed,
        action = %decision.action,
        risk = %decision.risk_tier,
        "policy decision"
    );
    decision
}

fn evaluate(record: &FailureRecord, ctx: &PolicyContext) -> PolicyDecision {
    let risk = risk_for(ctx.category, ctx.tier, record.transient);
    let task = &ctx.task_identity;

    if ctx.blocklist.contains(task) {
        return PolicyDecision::deny(
            format!("Task {} is blocklisted for automated remediation.", task),
            risk,
        );
    }

    if let Some(allowlist) = &ctx.allowlist_dags {
        if !allowlist.contains(&task.dag_id) {
            return PolicyDecision::deny(
                format!("DAG '{}' is not in the remediation allowlist.", task.dag_id),
                risk,
            );
        }
    }

    if ctx.category == FailureCategory::Unknown {
        return PolicyDecision::deny(
            "Failure signature was not recognized; manual review required before any action.",
            risk,
        );
    }

    if ctx.category.is_data_correctness() {
        return PolicyDecision::deny(
            format!(
                "Root cause '{}' is a data-correctness issue and requires human judgment; a rerun would not fix the data.",
                ctx.category
            ),
            risk,
        );
    }

    if ctx.retry_count >= ctx.retry_ceiling {
        return PolicyDecision::deny(
            format!(
                "Retry ceiling reached ({} retries, ceiling {}); escalate to the pipeline owner instead of retrying again.",
                ctx.retry_count, ctx.retry_ceiling
            ),
            risk,
        );
    }

    if let Some(window) = &ctx.window {
        let inside = ctx.now.is_some_and(|now| window.contains(now));
        if !inside {
            return PolicyDecision::deny(
                format!(
                    "Outside the remediation window {}-{}.",
                    window.start.format("%H:%M"),
                    window.end.format("%H:%M")
                ),
                risk,
            );
        }
    }

    // No wildcard arm: a new category must be given a policy here
    match ctx.category {
        FailureCategory::DependencyFailure => PolicyDecision::allow(
            RemediationAction::ClearTask,
            "Dependency failure: clearing lets the scheduler re-resolve dependency state.",
            risk,
        ),
        FailureCategory::Timeout => PolicyDecision::allow(
            RemediationAction::RerunTask,
            "Timeout is transient; safe to rerun.",
            risk,
        ),
        FailureCategory::ComputeJobFailure if record.transient => PolicyDecision::allow(
            RemediationAction::RerunTask,
            "Transient compute failure; safe to rerun.",
            risk,
        ),
        FailureCategory::ComputeJobFailure
        | FailureCategory::UpstreamDataMissing
        | FailureCategory::OutOfMemory
        | FailureCategory::PermissionDenied
        | FailureCategory::SchemaDrift
        | FailureCategory::DataQualityViolation
        | FailureCategory::Unknown => PolicyDecision::deny(DEFAULT_DENIAL, risk),
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
