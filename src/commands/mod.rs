// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod pages;
pub mod projects;
pub mod resolve;
pub mod routes;
pub mod view;

use crate::bootstrap::BootstrapGate;
use crate::config::ViewerConfig;
use crate::source;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::sync::Arc;

/// How commands print their results
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Print machine-readable JSON instead of text
    pub json: bool,
    /// Use terminal colors in text output
    pub color: bool,
}

impl Output {
    /// Create an output mode
    #[must_use]
    pub fn new(json: bool, color: bool) -> Self {
        Self { json, color }
    }

    /// Print `value` as pretty JSON on stdout
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{text}");
        Ok(())
    }

    /// Emphasised text
    #[must_use]
    pub fn strong(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Success-colored text
    #[must_use]
    pub fn good(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    /// Error-colored text
    #[must_use]
    pub fn bad(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// De-emphasised text
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Open the configured archive behind a bootstrap gate
pub fn open_gate(config: &ViewerConfig) -> Result<Arc<BootstrapGate>> {
    let source = source::open(&config.data_root)
        .with_context(|| format!("Failed to open archive at {}", config.data_root))?;
    Ok(Arc::new(BootstrapGate::new(source, config.index_file.clone())))
}
