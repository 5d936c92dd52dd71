// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pd-core: diagnosis and remediation policy for Pipeline Doctor (pd)
//!
//! This crate provides:
//! - Rule-based failure classification of scheduler and compute logs
//! - Run correlation between scheduler task runs and compute runs
//! - Root-cause report synthesis
//! - The remediation policy engine
//!
//! Everything here is pure and synchronous; I/O lives in `pd-adapters`.

pub mod classify;
pub mod config;
pub mod correlate;
pub mod policy;
pub mod rca;
pub mod record;
pub mod text;

pub use classify::{classify, RuleError, RuleSet, RuleSpec};
pub use config::{Config, ConfigError, Limits};
pub use correlate::{correlate, link_run};
pub use policy::{decide, risk_tier, PolicyConfig, PolicyContext, RemediationWindow};
pub use rca::{synthesize, Synthesizer};
pub use record::{
    Certainty, FailureCategory, FailureRecord, PolicyDecision, RcaSummary, RecordError,
    RemediationAction, RiskTier, RunLink, TaskIdentity, Tier,
};
