// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool commands: invoke a tool in-process, list tools

use crate::error::PdError;
use crate::output::{print, print_list, OutputFormat};
use clap::Args;
use pd_adapters::{NoOpComputeAdapter, NoOpSchedulerAdapter};
use pd_core::Config;
use pd_daemon::{ToolAdapter, ToolHandler, ToolOutcome, TOOLS};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Args)]
pub struct CallArgs {
    /// Tool name
    pub tool: String,
    /// Arguments as a JSON object
    #[arg(default_value = "{}")]
    pub arguments: String,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    description: &'static str,
}

impl fmt::Display for ToolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<22} {}", self.name, self.description)
    }
}

/// Tool result; text mode prints compact JSON
#[derive(Serialize)]
#[serde(transparent)]
struct ResultView(Value);

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Call one tool the same way `pdd` would, without platform access
pub async fn call(args: CallArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let arguments: Value = serde_json::from_str(&args.arguments).map_err(|e| {
        PdError::new("Tool arguments are not valid JSON")
            .with_context(e.to_string())
            .with_suggestion("Quote the object, for example: pd call list_tools '{}'")
    })?;

    let rules = config.build_rules().map_err(PdError::config_invalid)?;
    let tools = ToolAdapter::new(NoOpSchedulerAdapter::new(), NoOpComputeAdapter::new())
        .with_rules(Arc::new(rules))
        .with_synthesizer(config.synthesizer())
        .with_policy(config.policy.clone())
        .with_limits(config.limits);

    match tools.call(&args.tool, arguments).await {
        ToolOutcome::Ok(result) => {
            print(&ResultView(result), format);
            Ok(())
        }
        ToolOutcome::Err(e) => {
            Err(PdError::tool_failed(&args.tool, &e.kind.to_string(), &e.message).into())
        }
    }
}

pub fn list(format: OutputFormat) {
    let tools: Vec<ToolInfo> = TOOLS
        .iter()
        .map(|&(name, description)| ToolInfo { name, description })
        .collect();
    print_list(&tools, format);
}
