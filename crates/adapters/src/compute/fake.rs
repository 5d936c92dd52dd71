// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake compute adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::ComputeAdapter;
use crate::AdapterError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded compute call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCall {
    GetRunOutput { run_id: String },
    GetRunError { run_id: String },
}

#[derive(Debug, Clone, Default)]
struct FakeRun {
    output: String,
    error: String,
}

/// Fake compute adapter for testing
#[derive(Clone, Default)]
pub struct FakeComputeAdapter {
    runs: Arc<Mutex<HashMap<String, FakeRun>>>,
    calls: Arc<Mutex<Vec<ComputeCall>>>,
}

impl FakeComputeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compute run with its output and error text
    pub fn add_run(&self, run_id: &str, output: &str, error: &str) {
        self.runs.lock().unwrap_or_else(|e| e.into_inner()).insert(
            run_id.to_string(),
            FakeRun {
                output: output.to_string(),
                error: error.to_string(),
            },
        );
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ComputeCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn run(&self, run_id: &str) -> Result<FakeRun, AdapterError> {
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(run_id)
            .cloned()
            .ok_or_else(|| AdapterError::NotFound(format!("compute run {}", run_id)))
    }
}

#[async_trait]
impl ComputeAdapter for FakeComputeAdapter {
    async fn get_run_output(&self, run_id: &str) -> Result<String, AdapterError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ComputeCall::GetRunOutput {
                run_id: run_id.to_string(),
            });
        Ok(self.run(run_id)?.output)
    }

    async fn get_run_error(&self, run_id: &str) -> Result<String, AdapterError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ComputeCall::GetRunError {
                run_id: run_id.to_string(),
            });
        Ok(self.run(run_id)?.error)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
