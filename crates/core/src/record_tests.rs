// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    upstream = { "upstream_data_missing", FailureCategory::UpstreamDataMissing },
    schema = { "schema_drift", FailureCategory::SchemaDrift },
    quality = { "data_quality_violation", FailureCategory::DataQualityViolation },
    compute = { "compute_job_failure", FailureCategory::ComputeJobFailure },
    oom = { "out_of_memory", FailureCategory::OutOfMemory },
    dependency = { "dependency_failure", FailureCategory::DependencyFailure },
    permission = { "permission_denied", FailureCategory::PermissionDenied },
    timeout = { "timeout", FailureCategory::Timeout },
    unknown = { "unknown", FailureCategory::Unknown },
)]
fn category_names_match_wire_format(name: &str, category: FailureCategory) {
    assert_eq!(category.as_str(), name);
    assert_eq!(name.parse::<FailureCategory>().unwrap(), category);
    assert_eq!(
        serde_json::to_string(&category).unwrap(),
        format!("\"{}\"", name)
    );
}

#[test]
fn category_parse_rejects_unknown_names() {
    let err = "disk_full".parse::<FailureCategory>().unwrap_err();
    assert!(err.contains("disk_full"));
}

#[test]
fn only_schema_and_quality_are_data_correctness() {
    let correctness: Vec<_> = FailureCategory::ALL
        .into_iter()
        .filter(|c| c.is_data_correctness())
        .collect();
    assert_eq!(
        correctness,
        vec![
            FailureCategory::SchemaDrift,
            FailureCategory::DataQualityViolation
        ]
    );
}

#[test]
fn tier_parses_case_insensitively() {
    assert_eq!("Compute".parse::<Tier>().unwrap(), Tier::Compute);
    assert_eq!(" scheduler ".parse::<Tier>().unwrap(), Tier::Scheduler);
    assert!("spark".parse::<Tier>().is_err());
}

#[test]
fn task_identity_splits_on_first_dot() {
    let id: TaskIdentity = "gold_sales_daily.group.load".parse().unwrap();
    assert_eq!(id.dag_id, "gold_sales_daily");
    assert_eq!(id.task_id, "group.load");
    assert_eq!(id.to_string(), "gold_sales_daily.group.load");
}

#[parameterized(
    no_dot = { "gold_sales_daily" },
    empty_dag = { ".load" },
    empty_task = { "gold_sales_daily." },
)]
fn task_identity_rejects_malformed(input: &str) {
    assert!(input.parse::<TaskIdentity>().is_err());
}

#[test]
fn unknown_record_has_zero_confidence() {
    let record = FailureRecord::unknown(Tier::Scheduler, "tail".to_string());
    assert!(record.is_unknown());
    assert_eq!(record.confidence, 0.0);
    assert!(record.matched_pattern.is_empty());
    assert!(!record.transient);
}

#[test]
fn record_deserializes_without_optional_fields() {
    let record: FailureRecord =
        serde_json::from_str(r#"{"category":"timeout","confidence":0.95,"tier":"scheduler"}"#)
            .unwrap();
    assert_eq!(record.category, FailureCategory::Timeout);
    assert!(record.source_excerpt.is_empty());
    assert!(!record.transient);
}

#[test]
fn run_link_absent_by_default() {
    let link = RunLink::new("transform", "manual__2024-06-15");
    assert!(!link.is_linked());

    let link = link.with_compute_run_id(Some("778241".to_string()));
    assert_eq!(link.compute_run_id.as_deref(), Some("778241"));
}

#[test]
fn risk_tier_raises_and_saturates() {
    assert_eq!(RiskTier::Low.raised(), RiskTier::Medium);
    assert_eq!(RiskTier::Medium.raised(), RiskTier::High);
    assert_eq!(RiskTier::High.raised(), RiskTier::High);
}

#[test]
fn denial_never_carries_an_action() {
    let decision = PolicyDecision::deny("blocked", RiskTier::High);
    assert!(!decision.allowed);
    assert_eq!(decision.action, RemediationAction::None);
}

fn record(category: FailureCategory, confidence: f64) -> FailureRecord {
    FailureRecord {
        category,
        matched_pattern: String::new(),
        confidence,
        source_excerpt: String::new(),
        tier: Tier::Scheduler,
        transient: false,
    }
}

#[parameterized(
    above_one = { FailureCategory::Timeout, 7.5 },
    negative = { FailureCategory::Timeout, -3.0 },
    not_a_number = { FailureCategory::Timeout, f64::NAN },
    unknown_with_confidence = { FailureCategory::Unknown, 0.99 },
)]
fn validate_rejects_bad_confidence(category: FailureCategory, confidence: f64) {
    assert!(record(category, confidence).validate(400).is_err());
}

#[test]
fn validate_rejects_unknown_with_pattern() {
    let mut unknown = record(FailureCategory::Unknown, 0.0);
    unknown.matched_pattern = "TimeoutException".to_string();
    assert_eq!(
        unknown.validate(400),
        Err(RecordError::UnknownWithPattern("TimeoutException".to_string()))
    );
}

#[test]
fn validate_bounds_excerpt_but_not_its_markers() {
    let mut timeout = record(FailureCategory::Timeout, 0.95);
    timeout.source_excerpt = format!("...{}...", "x".repeat(10));
    assert_eq!(timeout.validate(10), Ok(()));

    timeout.source_excerpt = "x".repeat(11);
    assert_eq!(
        timeout.validate(10),
        Err(RecordError::ExcerptTooLong { len: 11, max: 10 })
    );
}

#[test]
fn validate_accepts_classifier_shaped_records() {
    assert_eq!(record(FailureCategory::Timeout, 1.0).validate(400), Ok(()));
    assert_eq!(record(FailureCategory::Unknown, 0.0).validate(400), Ok(()));
}
