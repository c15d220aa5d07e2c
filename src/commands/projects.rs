// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Projects command - bootstraps the archive and lists its projects

use super::{open_gate, Output};
use crate::config::ViewerConfig;
use crate::views::ProjectSummary;
use anyhow::{Context, Result};

/// Run the projects command
pub async fn run(config: &ViewerConfig, output: Output) -> Result<()> {
    let gate = open_gate(config)?;
    let registry = gate
        .ready()
        .await
        .with_context(|| format!("Failed to bootstrap archive at {}", gate.source().describe()))?;

    let projects: Vec<ProjectSummary> = registry.iter().map(ProjectSummary::from).collect();

    if output.json {
        return output.print_json(&projects);
    }

    if projects.is_empty() {
        println!("No projects in {}", gate.source().describe());
        return Ok(());
    }

    println!("{} projects:", projects.len());
    println!();
    for project in &projects {
        println!("  {} {}", output.strong(&project.slug), output.dim(&format!("({})", project.name)));
        if let Some(description) = &project.description {
            println!("    {description}");
        }
        match &project.mirror_url {
            Some(mirror) => println!("    mirror: {}", output.good(mirror)),
            None => println!("    mirror: {}", output.dim("none")),
        }
    }
    Ok(())
}
