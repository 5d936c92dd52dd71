// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op scheduler adapter for when no scheduler is configured.

use super::{FailedTask, SchedulerAdapter};
use crate::AdapterError;
use async_trait::async_trait;
use pd_core::{RemediationAction, TaskIdentity};

const NOT_CONFIGURED: &str = "no scheduler is configured";

/// Scheduler adapter that reports every call as unavailable.
///
/// Composite tools then fail with a collaborator error while the pure
/// tools keep working.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpSchedulerAdapter;

impl NoOpSchedulerAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SchedulerAdapter for NoOpSchedulerAdapter {
    async fn get_failed_tasks(
        &self,
        _dag_id: &str,
        _run_id: &str,
    ) -> Result<Vec<FailedTask>, AdapterError> {
        Err(AdapterError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn get_task_log(
        &self,
        _task: &TaskIdentity,
        _run_id: &str,
        _try_number: u32,
    ) -> Result<String, AdapterError> {
        Err(AdapterError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    async fn trigger_action(
        &self,
        _action: RemediationAction,
        _task: &TaskIdentity,
        _run_id: &str,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::Unavailable(NOT_CONFIGURED.to_string()))
    }
}
