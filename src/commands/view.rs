// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! View command - navigates to a URL and loads the activated view's data

use super::{open_gate, Output};
use crate::config::ViewerConfig;
use crate::router::{Router, Transition};
use crate::views::ViewLoader;
use anyhow::{Context, Result};

/// Run the view command.
///
/// The view model is always printed as JSON; `--json` only affects how
/// external links are reported.
pub async fn run(config: &ViewerConfig, output: Output, url: &str) -> Result<()> {
    let gate = open_gate(config)?;
    let mut router = Router::from_config(config, gate.clone())?;

    let state = match router.navigate(url).await {
        Transition::Activated(state) | Transition::Retained(state) => state,
        Transition::External(target) => {
            if output.json {
                output.print_json(&serde_json::json!({ "external": target }))?;
            } else {
                println!("{} leaves the archive for {}", output.strong(url), output.good(&target));
            }
            return Ok(());
        }
        Transition::Failed(err) => return Err(err).with_context(|| format!("Failed to navigate to {url}")),
    };

    let registry = gate.ready().await?;
    let loader = ViewLoader::new(gate.source().clone(), registry).with_max_pages(config.max_pages);
    let model = loader
        .load(&state)
        .await
        .with_context(|| format!("Failed to load {} for {}", state.view, url))?;

    output.print_json(&model)
}
