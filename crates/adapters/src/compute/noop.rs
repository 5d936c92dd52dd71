// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ComputeAdapter;
use crate::AdapterError;
use async_trait::async_trait;

/// Compute adapter for deployments without compute access.
///
/// Diagnosis proceeds on scheduler evidence alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpComputeAdapter;

impl NoOpComputeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ComputeAdapter for NoOpComputeAdapter {
    async fn get_run_output(&self, _run_id: &str) -> Result<String, AdapterError> {
        Err(AdapterError::Unavailable(
            "no compute platform is configured".to_string(),
        ))
    }

    async fn get_run_error(&self, _run_id: &str) -> Result<String, AdapterError> {
        Err(AdapterError::Unavailable(
            "no compute platform is configured".to_string(),
        ))
    }
}
