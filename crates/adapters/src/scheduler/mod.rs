// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow scheduler adapters

mod noop;

pub use noop::NoOpSchedulerAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSchedulerAdapter, SchedulerCall};

use crate::AdapterError;
use async_trait::async_trait;
use pd_core::{RemediationAction, TaskIdentity};
use serde::{Deserialize, Serialize};

/// A task instance that failed in a DAG run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTask {
    pub identity: TaskIdentity,
    /// Attempt whose log should be read
    pub try_number: u32,
}

/// Adapter for the workflow scheduler (Airflow-style REST API)
#[async_trait]
pub trait SchedulerAdapter: Clone + Send + Sync + 'static {
    /// Failed task instances of one DAG run
    async fn get_failed_tasks(
        &self,
        dag_id: &str,
        run_id: &str,
    ) -> Result<Vec<FailedTask>, AdapterError>;

    /// Log text of one task attempt
    async fn get_task_log(
        &self,
        task: &TaskIdentity,
        run_id: &str,
        try_number: u32,
    ) -> Result<String, AdapterError>;

    /// Ask the scheduler to clear or rerun a task instance
    async fn trigger_action(
        &self,
        action: RemediationAction,
        task: &TaskIdentity,
        run_id: &str,
    ) -> Result<(), AdapterError>;
}
