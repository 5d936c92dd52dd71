// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Render a value: `Display` for text, pretty JSON otherwise
pub fn render<T: Serialize + Display + ?Sized>(value: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => value.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to encode output: {}\"}}", e)),
    }
}

/// Print output in the specified format
pub fn print<T: Serialize + Display + ?Sized>(value: &T, format: OutputFormat) {
    println!("{}", render(value, format));
}

/// Print a list of items, one per line in text mode
pub fn print_list<T: Serialize + Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => println!("{}", render(&Listed(items), format)),
    }
}

/// Indent every line of a block for text reports
pub fn indent(text: &str, by: usize) -> String {
    let pad = " ".repeat(by);
    text.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
#[serde(transparent)]
struct Listed<'a, T>(&'a [T]);

impl<T> Display for Listed<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} items", self.0.len())
    }
}
