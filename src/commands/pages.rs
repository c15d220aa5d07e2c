// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Pages command - walks a paginated resource to its end

use super::Output;
use crate::config::ViewerConfig;
use crate::pagination::Paginator;
use crate::source;
use anyhow::{Context, Result};
use futures::TryStreamExt;
use serde_json::Value;
use tracing::info;

/// Run the pages command
pub async fn run(config: &ViewerConfig, output: Output, start: &str) -> Result<()> {
    let source = source::open(&config.data_root)
        .with_context(|| format!("Failed to open archive at {}", config.data_root))?;
    let paginator = Paginator::new(source.as_ref()).with_max_pages(config.max_pages);

    let mut pages = std::pin::pin!(paginator.pages::<Value>(start));
    let mut items = Vec::new();
    let mut count = 0usize;
    while let Some(page) = pages
        .try_next()
        .await
        .with_context(|| format!("Failed to walk pages from {start}"))?
    {
        count += 1;
        if !output.json {
            println!("  page {:>4}: {} items", count, page.values.len());
        }
        items.extend(page.values);
    }
    info!("Walked {} pages from {}", count, start);

    if output.json {
        return output.print_json(&serde_json::json!({
            "start": start,
            "pages": count,
            "items": items,
        }));
    }

    println!("{} items across {} pages", output.strong(&items.len().to_string()), count);
    Ok(())
}
