// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct PdError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PdError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for PdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for PdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for typical failure scenarios.
impl PdError {
    /// Error for a config file that could not be loaded.
    pub fn config_invalid(source: pd_core::ConfigError) -> Self {
        PdError::new("Failed to load configuration")
            .with_context(source.to_string())
            .with_suggestion("Check the file named by --config or PD_CONFIG")
            .with_suggestion("Run without a config file to use the built-in defaults")
            .with_source(source)
    }

    /// Error for an input file that could not be read.
    pub fn input_unreadable(path: &Path, source: std::io::Error) -> Self {
        PdError::new(format!("Cannot read {}", path.display()))
            .with_context(source.to_string())
            .with_suggestion("Pass '-' or omit the path to read from stdin")
            .with_source(source)
    }

    /// Error for an invalid `--now` value.
    pub fn bad_time(value: &str) -> Self {
        PdError::new(format!("Invalid time of day '{}'", value))
            .with_suggestion("Use 24-hour HH:MM, for example --now 02:30")
    }

    /// Error reported by a tool call.
    pub fn tool_failed(tool: &str, kind: &str, message: &str) -> Self {
        let err = PdError::new(format!("Tool '{}' failed ({})", tool, kind)).with_context(message);
        match kind {
            "unknown_tool" => err.with_suggestion("List the available tools: pd tools"),
            "invalid_argument" | "invalid_request" => {
                err.with_suggestion("Arguments must be a JSON object; see: pd tools")
            }
            "collaborator" => err.with_context(
                "The scheduler or compute platform could not be reached from this command",
            ),
            _ => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PdError::new("Something went wrong")
            .with_context("First context")
            .with_context("Second context")
            .with_suggestion("Try this")
            .with_suggestion("Or this");

        let output = format!("{}", err);
        assert!(output.contains("error: Something went wrong"));
        assert!(output.contains("-> First context"));
        assert!(output.contains("-> Second context"));
        assert!(output.contains("1. Try this"));
        assert!(output.contains("2. Or this"));
    }

    #[test]
    fn test_tool_failed_suggests_listing_tools() {
        let err = PdError::tool_failed("frobnicate", "unknown_tool", "no tool named 'frobnicate'");
        let output = format!("{}", err);
        assert!(output.contains("frobnicate"));
        assert!(output.contains("pd tools"));
    }
}
