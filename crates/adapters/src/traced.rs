// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::compute::ComputeAdapter;
use crate::scheduler::{FailedTask, SchedulerAdapter};
use crate::AdapterError;
use async_trait::async_trait;
use pd_core::{RemediationAction, TaskIdentity};
use tracing::Instrument;

/// Wrapper that adds tracing to any SchedulerAdapter
#[derive(Clone)]
pub struct TracedSchedulerAdapter<S> {
    inner: S,
}

impl<S> TracedSchedulerAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SchedulerAdapter> SchedulerAdapter for TracedSchedulerAdapter<S> {
    async fn get_failed_tasks(
        &self,
        dag_id: &str,
        run_id: &str,
    ) -> Result<Vec<FailedTask>, AdapterError> {
        let span = tracing::info_span!("scheduler.failed_tasks", dag_id, run_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get_failed_tasks(dag_id, run_id).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(tasks) => tracing::info!(count = tasks.len(), elapsed_ms, "listed failed tasks"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "listing failed tasks failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_task_log(
        &self,
        task: &TaskIdentity,
        run_id: &str,
        try_number: u32,
    ) -> Result<String, AdapterError> {
        let span = tracing::info_span!("scheduler.task_log", %task, run_id, try_number);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get_task_log(task, run_id, try_number).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(log) => tracing::debug!(log_len = log.len(), elapsed_ms, "fetched log"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "log fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn trigger_action(
        &self,
        action: RemediationAction,
        task: &TaskIdentity,
        run_id: &str,
    ) -> Result<(), AdapterError> {
        let span = tracing::info_span!("scheduler.trigger", %action, %task, run_id);
        async {
            tracing::info!("triggering");
            let start = std::time::Instant::now();
            let result = self.inner.trigger_action(action, task, run_id).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "triggered"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "trigger failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any ComputeAdapter
#[derive(Clone)]
pub struct TracedComputeAdapter<C> {
    inner: C,
}

impl<C> TracedComputeAdapter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: ComputeAdapter> ComputeAdapter for TracedComputeAdapter<C> {
    async fn get_run_output(&self, run_id: &str) -> Result<String, AdapterError> {
        let span = tracing::info_span!("compute.run_output", run_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get_run_output(run_id).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // Missing compute evidence is expected; diagnosis carries on
            match &result {
                Ok(output) => tracing::debug!(output_len = output.len(), elapsed_ms, "fetched output"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "output fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_run_error(&self, run_id: &str) -> Result<String, AdapterError> {
        let span = tracing::info_span!("compute.run_error", run_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get_run_error(run_id).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(error) => tracing::debug!(error_len = error.len(), elapsed_ms, "fetched error"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "error fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
