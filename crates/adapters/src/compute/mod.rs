// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute platform adapters

mod noop;

pub use noop::NoOpComputeAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ComputeCall, FakeComputeAdapter};

use crate::AdapterError;
use async_trait::async_trait;

/// Adapter for the compute platform (Databricks-style jobs API)
#[async_trait]
pub trait ComputeAdapter: Clone + Send + Sync + 'static {
    /// Output (notebook result / logs) of a compute run
    async fn get_run_output(&self, run_id: &str) -> Result<String, AdapterError>;

    /// Error message and trace of a failed compute run
    async fn get_run_error(&self, run_id: &str) -> Result<String, AdapterError>;
}
