// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Offline diagnosis commands: classify, correlate, rca, decide

use crate::commands::read_input;
use crate::error::PdError;
use crate::output::{indent, print, OutputFormat};
use clap::Args;
use pd_core::policy::parse_time_of_day;
use pd_core::text::truncate_tail;
use pd_core::{
    link_run, Config, FailureRecord, PolicyContext, PolicyDecision, RcaSummary, RunLink,
    TaskIdentity, Tier,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Log file to classify (stdin when omitted or '-')
    pub file: Option<PathBuf>,
    /// Tier that produced the log
    #[arg(long, default_value = "scheduler")]
    pub tier: Tier,
}

#[derive(Args)]
pub struct CorrelateArgs {
    /// Scheduler task log (stdin when omitted or '-')
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "")]
    pub task_id: String,
    #[arg(long, default_value = "")]
    pub run_id: String,
}

#[derive(Args)]
pub struct RcaArgs {
    /// Scheduler task log (stdin when omitted or '-')
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "")]
    pub task_id: String,
    #[arg(long, default_value = "")]
    pub run_id: String,
    /// Output or error text of the linked compute run
    #[arg(long)]
    pub compute_output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecideArgs {
    /// Task log to classify (stdin when omitted or '-')
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub dag_id: String,
    #[arg(long)]
    pub task_id: String,
    #[arg(long, default_value = "scheduler")]
    pub tier: Tier,
    /// Automated retries already performed
    #[arg(long, default_value_t = 0)]
    pub retry_count: u32,
    /// Override the configured retry ceiling
    #[arg(long)]
    pub retry_ceiling: Option<u32>,
    /// Time of day the action would run (HH:MM, defaults to local time)
    #[arg(long)]
    pub now: Option<String>,
}

/// Text view of a failure record
#[derive(Serialize)]
#[serde(transparent)]
struct RecordView<'a>(&'a FailureRecord);

impl fmt::Display for RecordView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "category:   {}", r.category)?;
        writeln!(f, "confidence: {:.2}", r.confidence)?;
        writeln!(f, "tier:       {}", r.tier)?;
        if !r.matched_pattern.is_empty() {
            writeln!(f, "pattern:    {}", r.matched_pattern)?;
        }
        if r.transient {
            writeln!(f, "transient:  yes")?;
        }
        write!(f, "excerpt:\n{}", indent(&r.source_excerpt, 2))
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct LinkView<'a>(&'a RunLink);

impl fmt::Display for LinkView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.compute_run_id {
            Some(id) => write!(f, "compute run: {}", id),
            None => write!(f, "compute run: (not found)"),
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct SummaryView<'a>(&'a RcaSummary);

impl fmt::Display for SummaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        writeln!(f, "Root cause:\n{}", indent(&s.root_cause, 2))?;
        writeln!(f, "Details:\n{}", indent(&s.details, 2))?;
        writeln!(f, "Impact:\n{}", indent(&s.impact, 2))?;
        write!(f, "Suggested fix:\n{}", indent(&s.suggested_fix, 2))
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct DecisionView<'a>(&'a PolicyDecision);

impl fmt::Display for DecisionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.0;
        if d.allowed {
            writeln!(f, "ALLOWED: {}", d.action)?;
        } else {
            writeln!(f, "DENIED")?;
        }
        writeln!(f, "risk:   {}", d.risk_tier)?;
        write!(f, "reason: {}", d.reason)
    }
}

fn bounded_input(file: Option<&std::path::Path>, config: &Config) -> Result<String, PdError> {
    let text = read_input(file)?;
    Ok(truncate_tail(&text, config.limits.max_log_bytes).into_owned())
}

pub fn classify(args: ClassifyArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let rules = config.build_rules().map_err(PdError::config_invalid)?;
    let text = bounded_input(args.file.as_deref(), config)?;
    let record = rules.classify(&text, args.tier);
    print(&RecordView(&record), format);
    Ok(())
}

pub fn correlate(args: CorrelateArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let text = bounded_input(args.file.as_deref(), config)?;
    let link = link_run(&args.task_id, &args.run_id, &text);
    print(&LinkView(&link), format);
    Ok(())
}

/// Classify, correlate and synthesize from local files
pub fn rca(args: RcaArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let rules = config.build_rules().map_err(PdError::config_invalid)?;
    let log = bounded_input(args.file.as_deref(), config)?;
    let compute_output = match args.compute_output.as_deref() {
        Some(path) => Some(bounded_input(Some(path), config)?),
        None => None,
    };

    let link = link_run(&args.task_id, &args.run_id, &log);
    let record = rules.classify_evidence(&log, compute_output.as_deref());
    let summary = config
        .synthesizer()
        .synthesize(&record, &link, compute_output.as_deref());

    print(&SummaryView(&summary), format);
    Ok(())
}

pub fn decide(args: DecideArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    if args.dag_id.trim().is_empty() || args.task_id.trim().is_empty() {
        return Err(PdError::new("--dag-id and --task-id must not be empty").into());
    }
    let rules = config.build_rules().map_err(PdError::config_invalid)?;
    let text = bounded_input(args.file.as_deref(), config)?;
    let record = rules.classify(&text, args.tier);

    let identity = TaskIdentity::new(args.dag_id, args.task_id);
    let mut ctx =
        PolicyContext::new(&record, identity, &config.policy).with_retry_count(args.retry_count);
    if let Some(ceiling) = args.retry_ceiling {
        ctx = ctx.with_retry_ceiling(ceiling);
    }
    let now = match args.now.as_deref() {
        Some(now) => parse_time_of_day(now).map_err(|_| PdError::bad_time(now))?,
        None => chrono::Local::now().time(),
    };
    ctx = ctx.with_now(now);

    let decision = pd_core::decide(&record, &ctx);
    tracing::debug!(category = %record.category, allowed = decision.allowed, "decided");
    print(&DecisionView(&decision), format);
    Ok(())
}
