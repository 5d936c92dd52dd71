// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for tool calls.
//!
//! One JSON object per line in each direction:
//! - Request: `{"id": 1, "tool": "classify_failure", "arguments": {...}}`
//! - Response: `{"id": 1, "ok": true, "result": ...}` or
//!   `{"id": 1, "ok": false, "error": {"kind": "...", "message": "..."}}`

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Error kinds reported at the tool boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// The line was not a valid request
    InvalidRequest,
    /// Arguments were missing, ill-typed or out of range
    InvalidArgument,
    UnknownTool,
    /// The tool name names a destructive operation
    Blocked,
    /// The scheduler or compute platform failed
    Collaborator,
    Internal,
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolErrorKind::InvalidRequest => "invalid_request",
            ToolErrorKind::InvalidArgument => "invalid_argument",
            ToolErrorKind::UnknownTool => "unknown_tool",
            ToolErrorKind::Blocked => "blocked",
            ToolErrorKind::Collaborator => "collaborator",
            ToolErrorKind::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, message)
    }
}

impl From<ProtocolError> for ToolError {
    fn from(e: ProtocolError) -> Self {
        Self::new(ToolErrorKind::InvalidRequest, e.to_string())
    }
}

/// Result of one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Ok(Value),
    Err(ToolError),
}

impl ToolOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok(_))
    }
}

impl From<Result<Value, ToolError>> for ToolOutcome {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => ToolOutcome::Ok(value),
            Err(e) => ToolOutcome::Err(e),
        }
    }
}

#[derive(Serialize)]
struct OutcomeWire<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ToolError>,
}

impl Serialize for ToolOutcome {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            ToolOutcome::Ok(value) => OutcomeWire {
                ok: true,
                result: Some(value),
                error: None,
            },
            ToolOutcome::Err(e) => OutcomeWire {
                ok: false,
                result: None,
                error: Some(e),
            },
        };
        wire.serialize(s)
    }
}

/// Request from a client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Echoed back on the response; a string or a number
    #[serde(default)]
    pub id: Value,
    pub tool: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Response to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: Value,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

impl Response {
    pub fn new(id: Value, outcome: ToolOutcome) -> Self {
        Self { id, outcome }
    }

    /// Error response to a line that could not be decoded
    pub fn rejected(error: ProtocolError) -> Self {
        Self::new(Value::Null, ToolOutcome::Err(error.into()))
    }
}

/// Errors decoding a request line
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("request of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request id must be a string or a number")]
    BadId,
}

/// Decode one request line
pub fn decode_request(line: &str, max_bytes: usize) -> Result<Request, ProtocolError> {
    if line.len() > max_bytes {
        return Err(ProtocolError::TooLarge {
            len: line.len(),
            max: max_bytes,
        });
    }
    let request: Request = serde_json::from_str(line)?;
    match request.id {
        Value::String(_) | Value::Number(_) | Value::Null => Ok(request),
        _ => Err(ProtocolError::BadId),
    }
}

/// Encode a response as one line, without the trailing newline
pub fn encode_response(response: &Response) -> Result<String, serde_json::Error> {
    serde_json::to_string(response)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
