// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value objects passed between the classifier, correlator, synthesizer and
//! policy engine.
//!
//! Every type here is immutable once built. Records keep a bounded excerpt
//! of their source text, never the full log.

use crate::text::excerpt_body;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which side of the pipeline produced the failing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// DAG runs and their tasks
    Scheduler,
    /// Distributed transformation jobs
    Compute,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Scheduler => write!(f, "scheduler"),
            Tier::Compute => write!(f, "compute"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduler" => Ok(Tier::Scheduler),
            "compute" => Ok(Tier::Compute),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// Typed failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    UpstreamDataMissing,
    SchemaDrift,
    DataQualityViolation,
    ComputeJobFailure,
    OutOfMemory,
    DependencyFailure,
    PermissionDenied,
    Timeout,
    Unknown,
}

impl FailureCategory {
    /// All categories, in declaration order
    pub const ALL: [FailureCategory; 9] = [
        FailureCategory::UpstreamDataMissing,
        FailureCategory::SchemaDrift,
        FailureCategory::DataQualityViolation,
        FailureCategory::ComputeJobFailure,
        FailureCategory::OutOfMemory,
        FailureCategory::DependencyFailure,
        FailureCategory::PermissionDenied,
        FailureCategory::Timeout,
        FailureCategory::Unknown,
    ];

    /// Snake-case name, as used on the wire and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::UpstreamDataMissing => "upstream_data_missing",
            FailureCategory::SchemaDrift => "schema_drift",
            FailureCategory::DataQualityViolation => "data_quality_violation",
            FailureCategory::ComputeJobFailure => "compute_job_failure",
            FailureCategory::OutOfMemory => "out_of_memory",
            FailureCategory::DependencyFailure => "dependency_failure",
            FailureCategory::PermissionDenied => "permission_denied",
            FailureCategory::Timeout => "timeout",
            FailureCategory::Unknown => "unknown",
        }
    }

    /// Failures where the data itself is wrong. Rerunning cannot fix these.
    pub fn is_data_correctness(&self) -> bool {
        matches!(
            self,
            FailureCategory::SchemaDrift | FailureCategory::DataQualityViolation
        )
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        FailureCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown failure category: {}", s))
    }
}

/// A record that breaks its own invariants, usually one supplied by a caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("confidence {0} is outside 0.0..=1.0")]
    ConfidenceOutOfRange(f64),

    #[error("unknown records carry confidence 0.0, got {0}")]
    UnknownWithConfidence(f64),

    #[error("unknown records have no matched pattern, got '{0}'")]
    UnknownWithPattern(String),

    #[error("source excerpt has {len} chars, limit is {max}")]
    ExcerptTooLong { len: usize, max: usize },
}

/// A classified failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub category: FailureCategory,
    /// Rule pattern that matched (empty when nothing matched)
    #[serde(default)]
    pub matched_pattern: String,
    /// 0.0 ..= 1.0; higher means a more specific signature matched
    pub confidence: f64,
    /// Bounded snippet of the source text around the match
    #[serde(default)]
    pub source_excerpt: String,
    pub tier: Tier,
    /// Matched a signature known to clear up on retry
    #[serde(default)]
    pub transient: bool,
}

impl FailureRecord {
    /// Record for text that matched no rule
    pub fn unknown(tier: Tier, source_excerpt: String) -> Self {
        Self {
            category: FailureCategory::Unknown,
            matched_pattern: String::new(),
            confidence: 0.0,
            source_excerpt,
            tier,
            transient: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.category == FailureCategory::Unknown
    }

    /// Check the invariants the classifier guarantees for its own records.
    ///
    /// The excerpt bound ignores the `...` and `[truncated N chars]`
    /// markers that excerpting adds.
    pub fn validate(&self, max_excerpt_chars: usize) -> Result<(), RecordError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RecordError::ConfidenceOutOfRange(self.confidence));
        }
        if self.is_unknown() {
            if self.confidence != 0.0 {
                return Err(RecordError::UnknownWithConfidence(self.confidence));
            }
            if !self.matched_pattern.is_empty() {
                return Err(RecordError::UnknownWithPattern(self.matched_pattern.clone()));
            }
        }
        let len = excerpt_body(&self.source_excerpt).chars().count();
        if len > max_excerpt_chars {
            return Err(RecordError::ExcerptTooLong {
                len,
                max: max_excerpt_chars,
            });
        }
        Ok(())
    }
}

/// Links a scheduler task run to the compute run it submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLink {
    #[serde(default)]
    pub scheduler_task_id: String,
    #[serde(default)]
    pub scheduler_run_id: String,
    /// None when no identifier was found in the scheduler log
    #[serde(default)]
    pub compute_run_id: Option<String>,
}

impl RunLink {
    pub fn new(task_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            scheduler_task_id: task_id.into(),
            scheduler_run_id: run_id.into(),
            compute_run_id: None,
        }
    }

    pub fn with_compute_run_id(mut self, id: Option<String>) -> Self {
        self.compute_run_id = id;
        self
    }

    pub fn is_linked(&self) -> bool {
        self.compute_run_id.is_some()
    }
}

/// How strongly an RCA summary asserts its root cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Certainty {
    /// Specific signature backed by compute-tier evidence
    Confirmed,
    /// Plausible, but missing either specificity or compute evidence
    Likely,
    /// No rule matched
    Unrecognized,
}

/// Structured root-cause report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaSummary {
    pub root_cause: String,
    pub details: String,
    pub impact: String,
    pub suggested_fix: String,
    pub certainty: Certainty,
    pub evidence: FailureRecord,
    pub link: RunLink,
}

/// A task inside a DAG
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    pub dag_id: String,
    pub task_id: String,
}

impl TaskIdentity {
    pub fn new(dag_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dag_id, self.task_id)
    }
}

impl FromStr for TaskIdentity {
    type Err = String;

    /// Parses `dag_id.task_id`. Task ids may themselves contain dots
    /// (task groups), so only the first dot splits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((dag, task)) if !dag.is_empty() && !task.is_empty() => {
                Ok(TaskIdentity::new(dag, task))
            }
            _ => Err(format!("expected dag_id.task_id, got: {}", s)),
        }
    }
}

/// Remediation action the scheduler can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationAction {
    None,
    /// Reset task state so the scheduler re-resolves its dependencies
    ClearTask,
    /// Re-execute the task
    RerunTask,
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationAction::None => write!(f, "none"),
            RemediationAction::ClearTask => write!(f, "clear_task"),
            RemediationAction::RerunTask => write!(f, "rerun_task"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// One step up, saturating at High
    pub fn raised(self) -> Self {
        match self {
            RiskTier::Low => RiskTier::Medium,
            RiskTier::Medium | RiskTier::High => RiskTier::High,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// Verdict of the policy engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub action: RemediationAction,
    pub reason: String,
    pub risk_tier: RiskTier,
}

impl PolicyDecision {
    pub fn allow(action: RemediationAction, reason: impl Into<String>, risk_tier: RiskTier) -> Self {
        Self {
            allowed: true,
            action,
            reason: reason.into(),
            risk_tier,
        }
    }

    pub fn deny(reason: impl Into<String>, risk_tier: RiskTier) -> Self {
        Self {
            allowed: false,
            action: RemediationAction::None,
            reason: reason.into(),
            risk_tier,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
