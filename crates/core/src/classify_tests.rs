// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[test]
fn builtin_rules_are_valid_and_ordered() {
    let rules = RuleSet::new(builtin_rules()).unwrap();
    assert_eq!(rules.len(), builtin_rules().len());

    let confidences: Vec<f64> = rules.specs().map(|s| s.confidence).collect();
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn schema_drift_on_compute_output() {
    let record = classify(
        "Databricks run 4821 failed: column `amount` expected DOUBLE got STRING",
        Tier::Compute,
    );
    assert_eq!(record.category, FailureCategory::SchemaDrift);
    assert_eq!(record.confidence, EXACT_SIGNATURE);
    assert_eq!(record.tier, Tier::Compute);
    assert!(record.source_excerpt.contains("expected DOUBLE got STRING"));
}

#[parameterized(
    cannot_resolve = { "AnalysisException: cannot resolve 'amt' given input columns", FailureCategory::SchemaDrift },
    constraint = { "Delta constraint violation on table sales", FailureCategory::DataQualityViolation },
    null_row = { "NullPointerException while processing input row 17", FailureCategory::DataQualityViolation },
    missing_path = { "AnalysisException: Path does not exist: dbfs:/raw/sales/2024-06-15", FailureCategory::UpstreamDataMissing },
    forbidden = { "HTTP 403 Forbidden while reading s3://bucket", FailureCategory::PermissionDenied },
    heap = { "java.lang.OutOfMemoryError: Java heap space", FailureCategory::OutOfMemory },
    yarn = { "Container killed by YARN for exceeding memory limits. 5.5 GB of 5.5 GB", FailureCategory::OutOfMemory },
    executor_lost = { "ExecutorLostFailure (executor 3 exited caused by one of the running tasks)", FailureCategory::ComputeJobFailure },
    task_timeout = { "airflow.exceptions.AirflowTaskTimeout: Timeout, PID: 4242", FailureCategory::Timeout },
    heartbeat = { "Heartbeat missing from executor 7", FailureCategory::Timeout },
    upstream = { "Marking task as UPSTREAM_FAILED", FailureCategory::DependencyFailure },
)]
fn exact_signatures(text: &str, expected: FailureCategory) {
    let record = classify(text, Tier::Compute);
    assert_eq!(record.category, expected);
    assert_eq!(record.confidence, EXACT_SIGNATURE);
    assert!(!record.matched_pattern.is_empty());
}

#[parameterized(
    timed_out = { "task timed out waiting for the warehouse", FailureCategory::Timeout },
    denied = { "permission denied for relation sales", FailureCategory::PermissionDenied },
    missing = { "input file not found", FailureCategory::UpstreamDataMissing },
)]
fn generic_keywords_score_lower(text: &str, expected: FailureCategory) {
    let record = classify(text, Tier::Scheduler);
    assert_eq!(record.category, expected);
    assert_eq!(record.confidence, GENERIC_KEYWORD);
}

#[test]
fn broad_run_failure_is_least_confident() {
    let record = classify("Databricks run 99 failed with no message", Tier::Scheduler);
    assert_eq!(record.category, FailureCategory::ComputeJobFailure);
    assert_eq!(record.confidence, BROAD_FAILURE);
    assert!(!record.transient);
}

#[test]
fn transient_compute_signatures_are_flagged() {
    let record = classify("Run failed: INTERNAL_ERROR", Tier::Compute);
    assert_eq!(record.category, FailureCategory::ComputeJobFailure);
    assert!(record.transient);
}

#[test]
fn matching_is_case_insensitive() {
    let record = classify("JAVA.LANG.OUTOFMEMORYERROR", Tier::Compute);
    assert_eq!(record.category, FailureCategory::OutOfMemory);
}

#[test]
fn empty_text_is_unknown() {
    let record = classify("", Tier::Scheduler);
    assert!(record.is_unknown());
    assert_eq!(record.confidence, 0.0);
    assert_eq!(record.matched_pattern, "");
}

#[test]
fn unmatched_text_keeps_a_bounded_tail() {
    let text = "x".repeat(5000);
    let record = RuleSet::default()
        .with_excerpt_chars(100)
        .classify(&text, Tier::Scheduler);
    assert!(record.is_unknown());
    assert!(record.source_excerpt.starts_with(crate::text::TRUNCATED_PREFIX));
    assert!(record.source_excerpt.len() < 200);
}

#[test]
fn specific_signature_wins_in_either_text_order() {
    let generic = "the warehouse query timed out";
    let specific = "java.lang.OutOfMemoryError: GC overhead limit exceeded";

    for text in [
        format!("{}\n{}", generic, specific),
        format!("{}\n{}", specific, generic),
    ] {
        let record = classify(&text, Tier::Compute);
        assert_eq!(record.category, FailureCategory::OutOfMemory, "{}", text);
    }
}

#[test]
fn new_rejects_out_of_order_rules() {
    let err = RuleSet::new(vec![
        RuleSpec::new("timed out", FailureCategory::Timeout, GENERIC_KEYWORD),
        RuleSpec::new("TimeoutException", FailureCategory::Timeout, EXACT_SIGNATURE),
    ])
    .unwrap_err();
    assert!(matches!(err, RuleError::OutOfOrder { index: 1, .. }));
}

#[test]
fn new_rejects_invalid_regex() {
    let err = RuleSet::new(vec![RuleSpec::new(
        "([unclosed",
        FailureCategory::Timeout,
        0.9,
    )])
    .unwrap_err();
    assert!(matches!(err, RuleError::InvalidPattern { .. }));
}

#[parameterized(
    negative = { -0.1 },
    above_one = { 1.5 },
    nan = { f64::NAN },
)]
fn new_rejects_bad_confidence(confidence: f64) {
    let err = RuleSet::new(vec![RuleSpec::new(
        "x",
        FailureCategory::Timeout,
        confidence,
    )])
    .unwrap_err();
    assert!(matches!(err, RuleError::InvalidConfidence { .. }));
}

#[test]
fn new_rejects_rules_mapping_to_unknown() {
    let err = RuleSet::new(vec![RuleSpec::new("x", FailureCategory::Unknown, 0.5)]).unwrap_err();
    assert!(matches!(err, RuleError::UnknownCategory { .. }));
}

#[test]
fn extra_rules_take_precedence_at_equal_confidence() {
    let rules = RuleSet::with_extra_rules(vec![RuleSpec::new(
        "quota exceeded",
        FailureCategory::ComputeJobFailure,
        EXACT_SIGNATURE,
    )
    .transient()])
    .unwrap();

    let first = rules.specs().next().unwrap();
    assert_eq!(first.pattern, "quota exceeded");

    let record = rules.classify(
        "quota exceeded; also saw java.lang.OutOfMemoryError",
        Tier::Compute,
    );
    assert_eq!(record.category, FailureCategory::ComputeJobFailure);
    assert!(record.transient);
}

#[test]
fn extra_rules_are_placed_by_confidence() {
    let rules = RuleSet::with_extra_rules(vec![RuleSpec::new(
        "flaky",
        FailureCategory::Timeout,
        0.55,
    )])
    .unwrap();

    let patterns: Vec<&str> = rules.specs().map(|s| s.pattern.as_str()).collect();
    let pos = patterns.iter().position(|p| *p == "flaky").unwrap();
    assert_eq!(pos, patterns.len() - 2);
}

proptest! {
    #[test]
    fn digits_only_text_is_unknown(text in "[0-9 ]{0,200}") {
        let record = classify(&text, Tier::Scheduler);
        prop_assert!(record.is_unknown());
        prop_assert_eq!(record.confidence, 0.0);
    }

    #[test]
    fn classified_records_pass_validation(
        prefix in "[a-z \n]{0,600}",
        suffix in "[a-z \n]{0,600}",
        signature in prop::sample::select(vec!["TimeoutException", "schema mismatch detected", ""]),
    ) {
        let text = format!("{prefix} {signature} {suffix}");
        let record = classify(&text, Tier::Scheduler);
        prop_assert_eq!(record.validate(DEFAULT_EXCERPT_CHARS), Ok(()));
    }

    #[test]
    fn classify_is_deterministic(text in ".{0,200}") {
        prop_assert_eq!(classify(&text, Tier::Compute), classify(&text, Tier::Compute));
    }

    #[test]
    fn exact_beats_generic_wherever_placed(prefix in "[a-z ]{0,40}", suffix in "[a-z ]{0,40}") {
        let text = format!("{prefix} permission denied {suffix} ExecutorLostFailure");
        let record = classify(&text, Tier::Compute);
        prop_assert_eq!(record.category, FailureCategory::ComputeJobFailure);
        prop_assert_eq!(record.confidence, EXACT_SIGNATURE);
    }
}

#[test]
fn evidence_prefers_recognized_compute_text() {
    let rules = RuleSet::default();
    let record = rules.classify_evidence(
        "TimeoutException while waiting for run",
        Some("AnalysisException: cannot resolve 'amount'"),
    );
    assert_eq!(record.category, FailureCategory::SchemaDrift);
    assert_eq!(record.tier, Tier::Compute);
}

#[parameterized(
    no_compute_text = { None },
    unrecognized_compute_text = { Some("job finished with state: FAILED_STATE_42") },
)]
fn evidence_falls_back_to_scheduler_log(compute_text: Option<&str>) {
    let record = RuleSet::default().classify_evidence("TimeoutException after 3600s", compute_text);
    assert_eq!(record.category, FailureCategory::Timeout);
    assert_eq!(record.tier, Tier::Scheduler);
}
