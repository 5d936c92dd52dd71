// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn record(category: FailureCategory) -> FailureRecord {
    FailureRecord {
        category,
        matched_pattern: "p".to_string(),
        confidence: if category == FailureCategory::Unknown { 0.0 } else { 0.95 },
        source_excerpt: String::new(),
        tier: Tier::Scheduler,
        transient: false,
    }
}

fn task() -> TaskIdentity {
    TaskIdentity::new("gold_sales_daily", "transform_sales")
}

fn ctx(record: &FailureRecord) -> PolicyContext {
    PolicyContext::new(record, task(), &PolicyConfig::default())
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn timeout_with_no_retries_is_rerun() {
    let failure = record(FailureCategory::Timeout);
    let decision = decide(&failure, &ctx(&failure).with_retry_count(0));

    assert!(decision.allowed);
    assert_eq!(decision.action, RemediationAction::RerunTask);
    assert_eq!(decision.risk_tier, RiskTier::Low);
}

#[test]
fn timeout_past_ceiling_is_denied_with_escalation() {
    let failure = record(FailureCategory::Timeout);
    let context = ctx(&failure).with_retry_count(6).with_retry_ceiling(5);
    let decision = decide(&failure, &context);

    assert!(!decision.allowed);
    assert_eq!(decision.action, RemediationAction::None);
    assert!(decision.reason.contains("Retry ceiling"));
    assert!(decision.reason.contains("escalate"));
}

#[parameterized(
    below = { 1, 2, true },
    at = { 2, 2, false },
    above = { 3, 2, false },
    zero_ceiling = { 0, 0, false },
)]
fn retry_ceiling_boundary(retry_count: u32, ceiling: u32, allowed: bool) {
    let failure = record(FailureCategory::Timeout);
    let context = ctx(&failure)
        .with_retry_count(retry_count)
        .with_retry_ceiling(ceiling);
    assert_eq!(decide(&failure, &context).allowed, allowed);
}

#[test]
fn dependency_failure_is_cleared() {
    let failure = record(FailureCategory::DependencyFailure);
    let decision = decide(&failure, &ctx(&failure));

    assert!(decision.allowed);
    assert_eq!(decision.action, RemediationAction::ClearTask);
}

#[test]
fn transient_compute_failure_is_rerun() {
    let mut failure = record(FailureCategory::ComputeJobFailure);
    failure.transient = true;
    failure.tier = Tier::Compute;
    let decision = decide(&failure, &ctx(&failure));

    assert!(decision.allowed);
    assert_eq!(decision.action, RemediationAction::RerunTask);
    assert_eq!(decision.risk_tier, RiskTier::Medium);
}

#[test]
fn deterministic_compute_failure_falls_through_to_safe_denial() {
    let failure = record(FailureCategory::ComputeJobFailure);
    let decision = decide(&failure, &ctx(&failure));

    assert!(!decision.allowed);
    assert_eq!(decision.reason, DEFAULT_DENIAL);
}

#[parameterized(
    upstream = { FailureCategory::UpstreamDataMissing },
    oom = { FailureCategory::OutOfMemory },
    permission = { FailureCategory::PermissionDenied },
)]
fn categories_without_a_rule_default_to_denial(category: FailureCategory) {
    let failure = record(category);
    let decision = decide(&failure, &ctx(&failure));
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DEFAULT_DENIAL);
}

#[parameterized(
    schema = { FailureCategory::SchemaDrift },
    quality = { FailureCategory::DataQualityViolation },
    unknown = { FailureCategory::Unknown },
)]
fn human_judgment_categories_are_denied_as_high_risk(category: FailureCategory) {
    let failure = record(category);
    let decision = decide(&failure, &ctx(&failure));

    assert!(!decision.allowed);
    assert_eq!(decision.action, RemediationAction::None);
    assert_eq!(decision.risk_tier, RiskTier::High);
    assert!(!decision.reason.is_empty());
}

#[test]
fn blocklisted_task_is_denied_before_anything_else() {
    let failure = record(FailureCategory::Timeout);
    let context = ctx(&failure).with_blocklist([task()].into_iter().collect());
    let decision = decide(&failure, &context);

    assert!(!decision.allowed);
    assert!(decision.reason.contains("blocklisted"));
    assert!(decision.reason.contains("gold_sales_daily.transform_sales"));
}

#[test]
fn allowlist_excludes_other_dags() {
    let failure = record(FailureCategory::Timeout);
    let config = PolicyConfig {
        allowlist_dags: Some(["bronze_ingest".to_string()].into_iter().collect()),
        ..PolicyConfig::default()
    };
    let decision = decide(&failure, &PolicyContext::new(&failure, task(), &config));

    assert!(!decision.allowed);
    assert!(decision.reason.contains("allowlist"));
}

#[test]
fn empty_allowlist_denies_everything() {
    let failure = record(FailureCategory::DependencyFailure);
    let config = PolicyConfig {
        allowlist_dags: Some(BTreeSet::new()),
        ..PolicyConfig::default()
    };
    assert!(!decide(&failure, &PolicyContext::new(&failure, task(), &config)).allowed);
}

#[test]
fn allowlisted_dag_passes() {
    let failure = record(FailureCategory::Timeout);
    let config = PolicyConfig {
        allowlist_dags: Some(["gold_sales_daily".to_string()].into_iter().collect()),
        ..PolicyConfig::default()
    };
    assert!(decide(&failure, &PolicyContext::new(&failure, task(), &config)).allowed);
}

#[parameterized(
    inside = { 2, 30, true },
    at_start = { 1, 0, true },
    at_end = { 5, 0, false },
    outside = { 14, 0, false },
)]
fn window_limits_when_actions_run(h: u32, m: u32, allowed: bool) {
    let failure = record(FailureCategory::Timeout);
    let config = PolicyConfig {
        window: Some(RemediationWindow::new(hm(1, 0), hm(5, 0))),
        ..PolicyConfig::default()
    };
    let context = PolicyContext::new(&failure, task(), &config).with_now(hm(h, m));
    let decision = decide(&failure, &context);
    assert_eq!(decision.allowed, allowed);
    if !allowed {
        assert!(decision.reason.contains("01:00-05:00"));
    }
}

#[test]
fn window_without_current_time_is_denied() {
    let failure = record(FailureCategory::Timeout);
    let config = PolicyConfig {
        window: Some(RemediationWindow::new(hm(1, 0), hm(5, 0))),
        ..PolicyConfig::default()
    };
    assert!(!decide(&failure, &PolicyContext::new(&failure, task(), &config)).allowed);
}

#[test]
fn window_wraps_past_midnight() {
    let window = RemediationWindow::new(hm(22, 0), hm(2, 0));
    assert!(window.contains(hm(23, 0)));
    assert!(window.contains(hm(1, 59)));
    assert!(!window.contains(hm(2, 0)));
    assert!(!window.contains(hm(12, 0)));
}

#[test]
fn window_deserializes_short_times() {
    let window: RemediationWindow =
        serde_json::from_str(r#"{"start": "01:00", "end": "05:30:00"}"#).unwrap();
    assert_eq!(window.start, hm(1, 0));
    assert_eq!(window.end, hm(5, 30));
    assert_eq!(
        serde_json::to_string(&window).unwrap(),
        r#"{"start":"01:00","end":"05:30"}"#
    );
}

#[parameterized(
    timeout_scheduler = { FailureCategory::Timeout, Tier::Scheduler, RiskTier::Low },
    timeout_compute = { FailureCategory::Timeout, Tier::Compute, RiskTier::Medium },
    oom = { FailureCategory::OutOfMemory, Tier::Compute, RiskTier::Medium },
    permission = { FailureCategory::PermissionDenied, Tier::Scheduler, RiskTier::High },
    schema_scheduler = { FailureCategory::SchemaDrift, Tier::Scheduler, RiskTier::High },
)]
fn risk_tier_by_category_and_tier(category: FailureCategory, tier: Tier, expected: RiskTier) {
    let mut failure = record(category);
    failure.tier = tier;
    assert_eq!(risk_tier(&failure), expected);
}

fn any_category() -> impl Strategy<Value = FailureCategory> {
    prop::sample::select(FailureCategory::ALL.to_vec())
}

fn any_tier() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::Scheduler), Just(Tier::Compute)]
}

proptest! {
    #[test]
    fn blocklist_always_denies(category in any_category(), tier in any_tier(), transient in any::<bool>(), retries in 0u32..10) {
        let mut failure = record(category);
        failure.tier = tier;
        failure.transient = transient;
        let context = ctx(&failure)
            .with_retry_count(retries)
            .with_blocklist([task()].into_iter().collect());
        prop_assert!(!decide(&failure, &context).allowed);
    }

    #[test]
    fn decide_is_deterministic(category in any_category(), tier in any_tier(), transient in any::<bool>(), retries in 0u32..10, ceiling in 0u32..10) {
        let mut failure = record(category);
        failure.tier = tier;
        failure.transient = transient;
        let context = ctx(&failure).with_retry_count(retries).with_retry_ceiling(ceiling);
        prop_assert_eq!(decide(&failure, &context), decide(&failure, &context));
    }

    #[test]
    fn denials_explain_themselves(category in any_category(), transient in any::<bool>(), retries in 0u32..10) {
        let mut failure = record(category);
        failure.transient = transient;
        let decision = decide(&failure, &ctx(&failure).with_retry_count(retries));
        prop_assert!(!decision.reason.is_empty());
        if !decision.allowed {
            prop_assert_eq!(decision.action, RemediationAction::None);
        }
    }

    #[test]
    fn data_correctness_and_unknown_never_allowed(retries in 0u32..10, transient in any::<bool>()) {
        for category in [FailureCategory::SchemaDrift, FailureCategory::DataQualityViolation, FailureCategory::Unknown] {
            let mut failure = record(category);
            failure.transient = transient;
            prop_assert!(!decide(&failure, &ctx(&failure).with_retry_count(retries)).allowed);
        }
    }
}

#[test]
fn blocklist_reads_dotted_identities() {
    let config: PolicyConfig =
        serde_json::from_str(r#"{"blocklist": ["finance_daily.load_ledger"]}"#).unwrap();
    assert!(config
        .blocklist
        .contains(&TaskIdentity::new("finance_daily", "load_ledger")));
    assert_eq!(config.retry_ceiling, DEFAULT_RETRY_CEILING);

    let err = serde_json::from_str::<PolicyConfig>(r#"{"blocklist": ["nodot"]}"#).unwrap_err();
    assert!(err.to_string().contains("dag_id.task_id"));
}

#[test]
fn decision_reads_category_and_tier_from_context() {
    let failure = record(FailureCategory::Timeout);
    let mut context = ctx(&failure);
    context.category = FailureCategory::DependencyFailure;
    context.tier = Tier::Compute;

    let decision = decide(&failure, &context);
    assert_eq!(decision.action, RemediationAction::ClearTask);
    assert_eq!(decision.risk_tier, RiskTier::Medium);
}
