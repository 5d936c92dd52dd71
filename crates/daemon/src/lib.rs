// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pd-daemon: the Pipeline Doctor tool server
//!
//! Exposes the diagnosis and policy operations as named tools with typed
//! arguments, served as newline-delimited JSON over stdio by `pdd`.

pub mod lifecycle;
pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{Request, Response, ToolError, ToolErrorKind, ToolOutcome};
pub use server::{serve, ServerError};
pub use tools::{ToolAdapter, ToolHandler, TOOLS};
