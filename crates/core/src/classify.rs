// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure classification
//!
//! Maps raw log text to a [`FailureRecord`] by evaluating an ordered list of
//! rules. The list is ordered by specificity: exact error signatures first,
//! generic keywords after. The first rule that matches anywhere in the text
//! wins, so when a log carries several signatures the most specific one is
//! reported regardless of where it appears.

use crate::record::{FailureCategory, FailureRecord, Tier};
use crate::text::{excerpt_around, tail_chars};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Confidence of an exact error signature
pub const EXACT_SIGNATURE: f64 = 0.95;
/// Confidence of a generic keyword
pub const GENERIC_KEYWORD: f64 = 0.6;
/// Confidence of a broad "the job failed" match that names no cause
pub const BROAD_FAILURE: f64 = 0.5;

/// Default size of [`FailureRecord::source_excerpt`]
pub const DEFAULT_EXCERPT_CHARS: usize = 400;

/// Errors building a rule set
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("confidence {confidence} for {pattern:?} is outside 0.0..=1.0")]
    InvalidConfidence { pattern: String, confidence: f64 },
    #[error(
        "rule {index} ({pattern:?}, confidence {confidence}) is more specific than the rule before it"
    )]
    OutOfOrder {
        index: usize,
        pattern: String,
        confidence: f64,
    },
    #[error("rule {pattern:?} maps to unknown; unknown is reserved for unmatched text")]
    UnknownCategory { pattern: String },
}

/// A classification rule as written in config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub category: FailureCategory,
    pub confidence: f64,
    #[serde(default)]
    pub transient: bool,
}

impl RuleSpec {
    pub fn new(pattern: &str, category: FailureCategory, confidence: f64) -> Self {
        Self {
            pattern: pattern.to_string(),
            category,
            confidence,
            transient: false,
        }
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
struct Rule {
    spec: RuleSpec,
    regex: Regex,
}

/// An ordered, validated list of classification rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    excerpt_chars: usize,
}

impl RuleSet {
    /// Compile rules in the given order.
    ///
    /// Confidence must be non-increasing down the list: a rule may never be
    /// more specific than a rule evaluated before it.
    pub fn new(specs: Vec<RuleSpec>) -> Result<Self, RuleError> {
        let mut rules: Vec<Rule> = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            if !(0.0..=1.0).contains(&spec.confidence) {
                return Err(RuleError::InvalidConfidence {
                    pattern: spec.pattern,
                    confidence: spec.confidence,
                });
            }
            if spec.category == FailureCategory::Unknown {
                return Err(RuleError::UnknownCategory {
                    pattern: spec.pattern,
                });
            }
            if let Some(prev) = rules.last() {
                if spec.confidence > prev.spec.confidence {
                    return Err(RuleError::OutOfOrder {
                        index,
                        pattern: spec.pattern,
                        confidence: spec.confidence,
                    });
                }
            }
            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| RuleError::InvalidPattern {
                    pattern: spec.pattern.clone(),
                    source,
                })?;
            rules.push(Rule { spec, regex });
        }
        Ok(Self {
            rules,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        })
    }

    /// Built-in rules with `extra` merged in by confidence.
    ///
    /// Among rules of equal confidence the extra rules go first, so a
    /// deployment can override a built-in signature at the same tier.
    pub fn with_extra_rules(extra: Vec<RuleSpec>) -> Result<Self, RuleError> {
        Self::new(merge_by_confidence(extra, builtin_rules()))
    }

    /// Cap the excerpt kept in produced records
    pub fn with_excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = chars;
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order
    pub fn specs(&self) -> impl Iterator<Item = &RuleSpec> {
        self.rules.iter().map(|r| &r.spec)
    }

    /// Classify `log_text` produced by `tier`
    pub fn classify(&self, log_text: &str, tier: Tier) -> FailureRecord {
        for rule in &self.rules {
            if let Some(m) = rule.regex.find(log_text) {
                tracing::debug!(
                    category = %rule.spec.category,
                    pattern = %rule.spec.pattern,
                    offset = m.start(),
                    "rule matched"
                );
                return FailureRecord {
                    category: rule.spec.category,
                    matched_pattern: rule.spec.pattern.clone(),
                    confidence: rule.spec.confidence,
                    source_excerpt: excerpt_around(
                        log_text,
                        m.start(),
                        m.end(),
                        self.excerpt_chars,
                    ),
                    tier,
                    transient: rule.spec.transient,
                };
            }
        }

        tracing::debug!(%tier, text_len = log_text.len(), "no rule matched");
        FailureRecord::unknown(
            tier,
            tail_chars(log_text.trim_end(), self.excerpt_chars).into_owned(),
        )
    }

    /// Classify a failed task from both tiers.
    ///
    /// Compute output names the cause more precisely, so it is tried first;
    /// the scheduler log decides when there is no compute text or it matched
    /// nothing.
    pub fn classify_evidence(
        &self,
        scheduler_log: &str,
        compute_text: Option<&str>,
    ) -> FailureRecord {
        compute_text
            .map(|text| self.classify(text, Tier::Compute))
            .filter(|record| !record.is_unknown())
            .unwrap_or_else(|| self.classify(scheduler_log, Tier::Scheduler))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

// Built-in rules are validated by tests; a failure here is a programming error
#[allow(clippy::expect_used)]
static DEFAULT_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new(builtin_rules()).expect("built-in rules are valid"));

/// Classify with the built-in rule set
pub fn classify(log_text: &str, tier: Tier) -> FailureRecord {
    DEFAULT_RULES.classify(log_text, tier)
}

/// Stable merge of two confidence-ordered lists, `first` winning ties
fn merge_by_confidence(mut first: Vec<RuleSpec>, second: Vec<RuleSpec>) -> Vec<RuleSpec> {
    // Sort is stable, so custom rules keep their relative order
    first.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut merged = Vec::with_capacity(first.len() + second.len());
    let mut a = first.into_iter().peekable();
    let mut b = second.into_iter().peekable();
    loop {
        let take_first = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.confidence >= y.confidence,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_first { a.next() } else { b.next() };
        merged.extend(next);
    }
    merged
}

/// The built-in rules, most specific first
pub fn builtin_rules() -> Vec<RuleSpec> {
    use FailureCategory::*;

    vec![
        // Exact signatures
        RuleSpec::new(
            r"column\s+`?[\w.]+`?\s+expected\s+\w+\s+(?:but\s+)?got\s+\w+",
            SchemaDrift,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(r"AnalysisException:\s*cannot resolve", SchemaDrift, EXACT_SIGNATURE),
        RuleSpec::new(
            r"AnalysisException:.*column.*not found",
            SchemaDrift,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(
            r"schema (?:mismatch|variance) detected",
            SchemaDrift,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(r"constraint violation", DataQualityViolation, EXACT_SIGNATURE),
        RuleSpec::new(
            r"CHECK constraint \S+ .*violated",
            DataQualityViolation,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(
            r"NullPointerException.*input row",
            DataQualityViolation,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(
            r"expectation \S+ failed",
            DataQualityViolation,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(r"Path does not exist", UpstreamDataMissing, EXACT_SIGNATURE),
        RuleSpec::new(r"FileNotFoundException", UpstreamDataMissing, EXACT_SIGNATURE),
        RuleSpec::new(
            r"Table or view not found|TABLE_OR_VIEW_NOT_FOUND",
            UpstreamDataMissing,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(r"AccessDeniedException", PermissionDenied, EXACT_SIGNATURE),
        RuleSpec::new(r"403 Forbidden", PermissionDenied, EXACT_SIGNATURE),
        RuleSpec::new(r"does not have permission", PermissionDenied, EXACT_SIGNATURE),
        RuleSpec::new(r"java\.lang\.OutOfMemoryError", OutOfMemory, EXACT_SIGNATURE),
        RuleSpec::new(
            r"Container killed by YARN for exceeding memory limits",
            OutOfMemory,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(
            r"Total size of serialized results.*is bigger than",
            OutOfMemory,
            EXACT_SIGNATURE,
        ),
        RuleSpec::new(r"ExecutorLostFailure", ComputeJobFailure, EXACT_SIGNATURE).transient(),
        RuleSpec::new(
            r"Cluster \S+ (?:was )?terminated",
            ComputeJobFailure,
            EXACT_SIGNATURE,
        )
        .transient(),
        RuleSpec::new(r"INTERNAL_ERROR", ComputeJobFailure, EXACT_SIGNATURE).transient(),
        RuleSpec::new(r"TimeoutException", Timeout, EXACT_SIGNATURE),
        RuleSpec::new(r"AirflowTaskTimeout", Timeout, EXACT_SIGNATURE),
        RuleSpec::new(r"Heartbeat missing", Timeout, EXACT_SIGNATURE),
        RuleSpec::new(r"upstream_failed", DependencyFailure, EXACT_SIGNATURE),
        RuleSpec::new(r"Dependencies not met", DependencyFailure, EXACT_SIGNATURE),
        RuleSpec::new(
            r"ExternalTaskSensor.*(?:failed|timed out)",
            DependencyFailure,
            EXACT_SIGNATURE,
        ),
        // Generic keywords
        RuleSpec::new(r"\bschema\b", SchemaDrift, GENERIC_KEYWORD),
        RuleSpec::new(r"permission denied|unauthorized", PermissionDenied, GENERIC_KEYWORD),
        RuleSpec::new(r"out of memory", OutOfMemory, GENERIC_KEYWORD),
        RuleSpec::new(r"timed out|\btimeout\b", Timeout, GENERIC_KEYWORD),
        RuleSpec::new(r"no such file|not found", UpstreamDataMissing, GENERIC_KEYWORD),
        RuleSpec::new(r"\bdependenc(?:y|ies)\b", DependencyFailure, GENERIC_KEYWORD),
        // Broad job failure with no cause attached
        RuleSpec::new(
            r"(?:databricks )?run \S+ (?:failed|terminated)|result state:? *FAILED",
            ComputeJobFailure,
            BROAD_FAILURE,
        ),
    ]
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
