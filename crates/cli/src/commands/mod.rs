// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommands

pub mod analyze;
pub mod tools;

use crate::error::PdError;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read a file, or stdin when the path is absent or `-`
pub fn read_input(path: Option<&Path>) -> Result<String, PdError> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| PdError::input_unreadable(path, e)),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| PdError::input_unreadable(&PathBuf::from("<stdin>"), e))?;
            Ok(text)
        }
    }
}
