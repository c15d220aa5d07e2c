// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Resolve command - navigates to viewer URLs and reports the transitions

use super::{open_gate, Output};
use crate::config::ViewerConfig;
use crate::params::ParamValue;
use crate::router::{Router, Transition, ViewState};
use anyhow::{bail, Result};
use serde::Serialize;
use tracing::info;

/// A transition as printed by the CLI
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Report<'a> {
    /// A view was activated
    Activated {
        /// Requested URL
        url: &'a str,
        /// Resulting view state
        state: &'a ViewState,
    },
    /// The active view was kept
    Retained {
        /// Requested URL
        url: &'a str,
        /// Resulting view state
        state: &'a ViewState,
    },
    /// Navigation leaves the archive
    External {
        /// Requested URL
        url: &'a str,
        /// Target on the mirrored host
        target: &'a str,
    },
    /// Navigation failed
    Failed {
        /// Requested URL
        url: &'a str,
        /// Error category
        kind: &'static str,
        /// Error message
        error: String,
    },
}

impl<'a> Report<'a> {
    /// Describe `transition` for `url`
    #[must_use]
    pub fn new(url: &'a str, transition: &'a Transition) -> Self {
        match transition {
            Transition::Activated(state) => Self::Activated { url, state },
            Transition::Retained(state) => Self::Retained { url, state },
            Transition::External(target) => Self::External { url, target },
            Transition::Failed(err) => Self::Failed {
                url,
                kind: err.kind(),
                error: err.to_string(),
            },
        }
    }
}

/// Run the resolve command.
///
/// URLs are navigated in order on one router, so later URLs see the view
/// activated by earlier ones.
pub async fn run(config: &ViewerConfig, output: Output, urls: &[String]) -> Result<()> {
    let mut router = Router::from_config(config, open_gate(config)?)?;

    let mut transitions = Vec::with_capacity(urls.len());
    for url in urls {
        transitions.push(router.navigate(url).await);
    }

    let reports: Vec<Report<'_>> = urls
        .iter()
        .zip(&transitions)
        .map(|(url, transition)| Report::new(url, transition))
        .collect();

    if output.json {
        output.print_json(&reports)?;
    } else {
        for report in &reports {
            print_report(output, report);
        }
    }

    let failed = reports.iter().filter(|r| matches!(r, Report::Failed { .. })).count();
    info!("Resolved {} URLs, {} failed", urls.len(), failed);
    if failed > 0 {
        bail!("{} of {} navigations failed", failed, urls.len());
    }
    Ok(())
}

fn print_report(output: Output, report: &Report<'_>) {
    match report {
        Report::Activated { url, state } | Report::Retained { url, state } => {
            let verb = if matches!(report, Report::Activated { .. }) { "activated" } else { "retained" };
            println!("{} {} {}", output.strong(url), output.dim("->"), output.good(state.view.as_str()));
            println!("  {} {} at {}", output.dim(verb), state.pattern, state.location);
            for (name, value) in state.params.iter() {
                let value = match value {
                    ParamValue::Text(text) => text.clone(),
                    ParamValue::Page(page) => page.to_string(),
                };
                println!("  {name} = {value}");
            }
        }
        Report::External { url, target } => {
            println!("{} {} {}", output.strong(url), output.dim("->"), output.good(target));
        }
        Report::Failed { url, kind, error } => {
            println!("{} {} {}", output.strong(url), output.dim("->"), output.bad(kind));
            println!("  {error}");
        }
    }
}
