// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from scheduler and compute platform calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The platform could not be reached or is not configured
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The platform answered with an error
    #[error("request failed: {0}")]
    Request(String),
}
