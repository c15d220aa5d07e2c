// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Routes command - prints the route table in match order

use super::Output;
use crate::route::{RouteOutcome, RouteTable};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct RouteEntry {
    pattern: String,
    outcome: String,
}

/// Run the routes command
pub fn run(output: Output) -> Result<()> {
    let table = RouteTable::archive_default()?;

    if output.json {
        let entries: Vec<RouteEntry> = table
            .routes()
            .iter()
            .map(|route| RouteEntry {
                pattern: route.pattern.to_string(),
                outcome: route.outcome.to_string(),
            })
            .collect();
        return output.print_json(&serde_json::json!({
            "routes": entries,
            "otherwise": table.fallback(),
        }));
    }

    let width = table.routes().iter().map(|r| r.pattern.as_str().len()).max().unwrap_or(0);
    for route in table.routes() {
        let outcome = route.outcome.to_string();
        let outcome = match route.outcome {
            RouteOutcome::Render(_) => output.good(&outcome),
            RouteOutcome::Redirect(_) => output.dim(&outcome),
            RouteOutcome::Computed(_) => output.strong(&outcome),
        };
        println!("{:width$}  {}", route.pattern.as_str(), outcome);
    }
    println!("{:width$}  {}", "otherwise", output.dim(&format!("redirect {}", table.fallback())));
    Ok(())
}
