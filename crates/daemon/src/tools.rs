// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool boundary adapter.
//!
//! Validates arguments, bounds text, and dispatches named tool calls to the
//! core operations and the scheduler/compute collaborators. Errors are
//! returned as [`ToolError`] values; nothing here panics on bad input.

use crate::protocol::{ToolError, ToolErrorKind, ToolOutcome};
use async_trait::async_trait;
use chrono::NaiveTime;
use pd_adapters::{AdapterError, ComputeAdapter, FailedTask, SchedulerAdapter};
use pd_core::policy::parse_time_of_day;
use pd_core::text::truncate_tail;
use pd_core::{
    link_run, FailureRecord, Limits, PolicyConfig, PolicyContext, PolicyDecision, RcaSummary,
    RuleSet, RunLink, Synthesizer, TaskIdentity, Tier,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Tool names and descriptions, as reported by `list_tools`
pub const TOOLS: &[(&str, &str)] = &[
    (
        "classify_failure",
        "Classify a log excerpt into a failure category. Arguments: log_text, tier (scheduler|compute).",
    ),
    (
        "correlate_run",
        "Find the compute run id referenced by a scheduler task log. Arguments: scheduler_log_text, task_id?, run_id?.",
    ),
    (
        "build_rca",
        "Compose a root-cause report. Arguments: record, link, compute_output?.",
    ),
    (
        "decide_remediation",
        "Decide whether an automated clear or rerun may proceed. Arguments: record, dag_id, task_id, retry_count?, retry_ceiling?, blocklist?, now? (HH:MM, defaults to local time).",
    ),
    (
        "diagnose_task",
        "Fetch logs for the failed tasks of a DAG run and report a root cause for each. Arguments: dag_id, run_id, task_id?.",
    ),
    (
        "request_remediation",
        "Diagnose one failed task and, when policy allows, ask the scheduler to clear or rerun it. Arguments: dag_id, run_id, task_id, retry_count?, dry_run?, now? (HH:MM, defaults to local time).",
    ),
    ("list_tools", "List the available tools."),
];

/// Verbs that mark a tool name as destructive
const DESTRUCTIVE_VERBS: &[&str] = &["delete", "drop", "truncate"];

/// Something that answers named tool calls
#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    async fn call(&self, name: &str, arguments: Value) -> ToolOutcome;
}

/// Dispatches tool calls to the core and to the platform adapters
#[derive(Clone)]
pub struct ToolAdapter<S, C> {
    scheduler: S,
    compute: C,
    rules: Arc<RuleSet>,
    synthesizer: Synthesizer,
    policy: PolicyConfig,
    limits: Limits,
}

/// Diagnosis of one failed task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub task: TaskIdentity,
    pub try_number: u32,
    pub summary: RcaSummary,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassifyArgs {
    log_text: String,
    tier: Tier,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CorrelateArgs {
    scheduler_log_text: String,
    #[serde(default)]
    task_id: String,
    #[serde(default)]
    run_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildRcaArgs {
    record: FailureRecord,
    link: RunLink,
    #[serde(default)]
    compute_output: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DecideArgs {
    record: FailureRecord,
    dag_id: String,
    task_id: String,
    #[serde(default)]
    retry_count: u32,
    #[serde(default)]
    retry_ceiling: Option<u32>,
    #[serde(default)]
    blocklist: Option<Vec<String>>,
    #[serde(default)]
    now: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiagnoseArgs {
    dag_id: String,
    run_id: String,
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemediateArgs {
    dag_id: String,
    run_id: String,
    task_id: String,
    #[serde(default)]
    retry_count: Option<u32>,
    #[serde(default)]
    dry_run: bool,
    #[serde(default)]
    now: Option<String>,
}

impl<S: SchedulerAdapter, C: ComputeAdapter> ToolAdapter<S, C> {
    pub fn new(scheduler: S, compute: C) -> Self {
        Self {
            scheduler,
            compute,
            rules: Arc::new(RuleSet::default()),
            synthesizer: Synthesizer::default(),
            policy: PolicyConfig::default(),
            limits: Limits::default(),
        }
    }

    pub fn with_rules(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Records arrive from callers, so hold them to the classifier's invariants
    fn check_record(&self, record: &FailureRecord) -> Result<(), ToolError> {
        record
            .validate(self.limits.max_excerpt_chars)
            .map_err(|e| ToolError::invalid_argument(format!("invalid record: {}", e)))
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let lowered = name.to_lowercase();
        if let Some(verb) = DESTRUCTIVE_VERBS.iter().find(|v| lowered.contains(*v)) {
            return Err(ToolError::new(
                ToolErrorKind::Blocked,
                format!("tool '{}' names a destructive operation ({})", name, verb),
            ));
        }

        match name {
            "classify_failure" => to_value(self.classify_failure(parse_args(arguments)?)),
            "correlate_run" => to_value(self.correlate_run(parse_args(arguments)?)),
            "build_rca" => to_value(self.build_rca(parse_args(arguments)?)?),
            "decide_remediation" => to_value(self.decide_remediation(parse_args(arguments)?)?),
            "diagnose_task" => to_value(self.diagnose_task(parse_args(arguments)?).await?),
            "request_remediation" => self.request_remediation(parse_args(arguments)?).await,
            "list_tools" => Ok(list_tools()),
            _ => Err(ToolError::new(
                ToolErrorKind::UnknownTool,
                format!("no tool named '{}'; call list_tools for the available tools", name),
            )),
        }
    }

    fn classify_failure(&self, args: ClassifyArgs) -> FailureRecord {
        let text = truncate_tail(&args.log_text, self.limits.max_log_bytes);
        self.rules.classify(&text, args.tier)
    }

    fn correlate_run(&self, args: CorrelateArgs) -> RunLink {
        let text = truncate_tail(&args.scheduler_log_text, self.limits.max_log_bytes);
        link_run(&args.task_id, &args.run_id, &text)
    }

    fn build_rca(&self, args: BuildRcaArgs) -> Result<RcaSummary, ToolError> {
        self.check_record(&args.record)?;
        let output = args
            .compute_output
            .as_deref()
            .map(|o| truncate_tail(o, self.limits.max_log_bytes));
        Ok(self
            .synthesizer
            .synthesize(&args.record, &args.link, output.as_deref()))
    }

    fn decide_remediation(&self, args: DecideArgs) -> Result<PolicyDecision, ToolError> {
        self.check_record(&args.record)?;
        let identity = task_identity(&args.dag_id, &args.task_id)?;
        let mut ctx = PolicyContext::new(&args.record, identity, &self.policy)
            .with_retry_count(args.retry_count)
            .with_now(resolve_now(args.now.as_deref())?);
        if let Some(ceiling) = args.retry_ceiling {
            ctx = ctx.with_retry_ceiling(ceiling);
        }
        if let Some(blocklist) = args.blocklist {
            ctx = ctx.with_blocklist(parse_blocklist(&blocklist)?);
        }
        Ok(pd_core::decide(&args.record, &ctx))
    }

    async fn diagnose_task(&self, args: DiagnoseArgs) -> Result<Vec<Diagnosis>, ToolError> {
        require("dag_id", &args.dag_id)?;
        require("run_id", &args.run_id)?;

        let failed = self
            .scheduler
            .get_failed_tasks(&args.dag_id, &args.run_id)
            .await
            .map_err(collaborator)?;

        let selected: Vec<FailedTask> = match args.task_id.as_deref() {
            Some(task_id) => {
                let identity = task_identity(&args.dag_id, task_id)?;
                vec![find_failed(failed, &identity, &args.run_id)?]
            }
            None => failed,
        };

        let mut diagnoses = Vec::with_capacity(selected.len());
        for task in &selected {
            diagnoses.push(self.diagnose_one(task, &args.run_id).await?);
        }
        Ok(diagnoses)
    }

    async fn diagnose_one(&self, task: &FailedTask, run_id: &str) -> Result<Diagnosis, ToolError> {
        let log = self
            .scheduler
            .get_task_log(&task.identity, run_id, task.try_number)
            .await
            .map_err(collaborator)?;
        let log = truncate_tail(&log, self.limits.max_log_bytes);
        let link = link_run(&task.identity.task_id, run_id, &log);

        let compute_text = match &link.compute_run_id {
            Some(compute_run_id) => self.compute_evidence(compute_run_id).await,
            None => None,
        };

        let record = self.rules.classify_evidence(&log, compute_text.as_deref());

        let summary = self
            .synthesizer
            .synthesize(&record, &link, compute_text.as_deref());

        tracing::info!(
            task = %task.identity,
            run_id,
            category = %record.category,
            certainty = ?summary.certainty,
            "diagnosed"
        );

        Ok(Diagnosis {
            task: task.identity.clone(),
            try_number: task.try_number,
            summary,
        })
    }

    /// Error text and output of a compute run; absent when neither could be read
    async fn compute_evidence(&self, compute_run_id: &str) -> Option<String> {
        let error = self.compute.get_run_error(compute_run_id).await;
        let output = self.compute.get_run_output(compute_run_id).await;

        let parts: Vec<String> = [error, output]
            .into_iter()
            .filter_map(|part| match part {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(compute_run_id, error = %e, "compute evidence unavailable");
                    None
                }
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(truncate_tail(&parts.join("\n"), self.limits.max_log_bytes).into_owned())
        }
    }

    async fn request_remediation(&self, args: RemediateArgs) -> Result<Value, ToolError> {
        require("run_id", &args.run_id)?;
        let identity = task_identity(&args.dag_id, &args.task_id)?;
        let now = resolve_now(args.now.as_deref())?;

        let failed = self
            .scheduler
            .get_failed_tasks(&args.dag_id, &args.run_id)
            .await
            .map_err(collaborator)?;
        let task = find_failed(failed, &identity, &args.run_id)?;
        let diagnosis = self.diagnose_one(&task, &args.run_id).await?;

        // Attempts before this one are the retries already spent
        let retry_count = args
            .retry_count
            .unwrap_or_else(|| task.try_number.saturating_sub(1));
        let ctx = PolicyContext::new(&diagnosis.summary.evidence, identity.clone(), &self.policy)
            .with_retry_count(retry_count)
            .with_now(now);
        let decision = pd_core::decide(&diagnosis.summary.evidence, &ctx);

        let mut triggered = false;
        if decision.allowed && !args.dry_run {
            self.scheduler
                .trigger_action(decision.action, &identity, &args.run_id)
                .await
                .map_err(collaborator)?;
            triggered = true;
        }

        tracing::info!(
            task = %identity,
            run_id = %args.run_id,
            allowed = decision.allowed,
            action = %decision.action,
            risk = %decision.risk_tier,
            dry_run = args.dry_run,
            triggered,
            reason = %decision.reason,
            "remediation decision"
        );

        Ok(json!({
            "decision": decision,
            "summary": diagnosis.summary,
            "triggered": triggered,
        }))
    }
}

#[async_trait]
impl<S: SchedulerAdapter, C: ComputeAdapter> ToolHandler for ToolAdapter<S, C> {
    async fn call(&self, name: &str, arguments: Value) -> ToolOutcome {
        let start = std::time::Instant::now();
        let result = self.dispatch(name, arguments).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(tool = name, elapsed_ms, "tool call"),
            Err(e) => tracing::warn!(tool = name, elapsed_ms, kind = %e.kind, error = %e.message, "tool call failed"),
        }
        result.into()
    }
}

fn list_tools() -> Value {
    Value::Array(
        TOOLS
            .iter()
            .map(|(name, description)| json!({"name": name, "description": description}))
            .collect(),
    )
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::invalid_argument(format!("invalid arguments: {}", e)))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| ToolError::internal(format!("failed to encode result: {}", e)))
}

fn require(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        Err(ToolError::invalid_argument(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn task_identity(dag_id: &str, task_id: &str) -> Result<TaskIdentity, ToolError> {
    require("dag_id", dag_id)?;
    require("task_id", task_id)?;
    Ok(TaskIdentity::new(dag_id, task_id))
}

fn parse_blocklist(entries: &[String]) -> Result<BTreeSet<TaskIdentity>, ToolError> {
    entries
        .iter()
        .map(|entry| entry.parse::<TaskIdentity>().map_err(ToolError::invalid_argument))
        .collect()
}

/// Parse a caller-supplied `now`, defaulting to local wall-clock time
fn resolve_now(raw: Option<&str>) -> Result<NaiveTime, ToolError> {
    match raw {
        Some(raw) => parse_time_of_day(raw).map_err(|e| {
            ToolError::invalid_argument(format!("now must be HH:MM, got {:?}: {}", raw, e))
        }),
        None => Ok(chrono::Local::now().time()),
    }
}

fn find_failed(
    failed: Vec<FailedTask>,
    identity: &TaskIdentity,
    run_id: &str,
) -> Result<FailedTask, ToolError> {
    failed
        .into_iter()
        .filter(|task| &task.identity == identity)
        .max_by_key(|task| task.try_number)
        .ok_or_else(|| {
            ToolError::invalid_argument(format!(
                "task {} has no failed attempt in run {}",
                identity, run_id
            ))
        })
}

fn collaborator(e: AdapterError) -> ToolError {
    ToolError::new(ToolErrorKind::Collaborator, e.to_string())
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
