// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake scheduler adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{FailedTask, SchedulerAdapter};
use crate::AdapterError;
use async_trait::async_trait;
use pd_core::{RemediationAction, TaskIdentity};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded scheduler call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    GetFailedTasks {
        dag_id: String,
        run_id: String,
    },
    GetTaskLog {
        task: TaskIdentity,
        run_id: String,
        try_number: u32,
    },
    TriggerAction {
        action: RemediationAction,
        task: TaskIdentity,
        run_id: String,
    },
}

#[derive(Default)]
struct FakeSchedulerState {
    /// Failed tasks keyed by (dag_id, run_id)
    failed: HashMap<(String, String), Vec<FailedTask>>,
    /// Logs keyed by (task, run_id, try_number)
    logs: HashMap<(TaskIdentity, String, u32), String>,
    unavailable: bool,
    calls: Vec<SchedulerCall>,
}

/// Fake scheduler adapter for testing
#[derive(Clone, Default)]
pub struct FakeSchedulerAdapter {
    inner: Arc<Mutex<FakeSchedulerState>>,
}

impl FakeSchedulerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a failed task attempt and its log
    pub fn add_failure(&self, task: TaskIdentity, run_id: &str, try_number: u32, log: &str) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state
            .failed
            .entry((task.dag_id.clone(), run_id.to_string()))
            .or_default()
            .push(FailedTask {
                identity: task.clone(),
                try_number,
            });
        state
            .logs
            .insert((task, run_id.to_string(), try_number), log.to_string());
    }

    /// Make every call fail with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unavailable = unavailable;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Actions that reached the scheduler
    pub fn triggered(&self) -> Vec<(RemediationAction, TaskIdentity)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SchedulerCall::TriggerAction { action, task, .. } => Some((action, task)),
                _ => None,
            })
            .collect()
    }
}

fn check_available(state: &FakeSchedulerState) -> Result<(), AdapterError> {
    if state.unavailable {
        Err(AdapterError::Unavailable("fake scheduler offline".to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl SchedulerAdapter for FakeSchedulerAdapter {
    async fn get_failed_tasks(
        &self,
        dag_id: &str,
        run_id: &str,
    ) -> Result<Vec<FailedTask>, AdapterError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(SchedulerCall::GetFailedTasks {
            dag_id: dag_id.to_string(),
            run_id: run_id.to_string(),
        });
        check_available(&state)?;

        Ok(state
            .failed
            .get(&(dag_id.to_string(), run_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_task_log(
        &self,
        task: &TaskIdentity,
        run_id: &str,
        try_number: u32,
    ) -> Result<String, AdapterError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(SchedulerCall::GetTaskLog {
            task: task.clone(),
            run_id: run_id.to_string(),
            try_number,
        });
        check_available(&state)?;

        state
            .logs
            .get(&(task.clone(), run_id.to_string(), try_number))
            .cloned()
            .ok_or_else(|| {
                AdapterError::NotFound(format!("log for {} run {} try {}", task, run_id, try_number))
            })
    }

    async fn trigger_action(
        &self,
        action: RemediationAction,
        task: &TaskIdentity,
        run_id: &str,
    ) -> Result<(), AdapterError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(SchedulerCall::TriggerAction {
            action,
            task: task.clone(),
            run_id: run_id.to_string(),
        });
        check_available(&state)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
