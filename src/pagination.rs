// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Walking `next`-linked page chains

use crate::error::{Result, ViewerError};
use crate::source::{fetch_as, DataSource};
use crate::types::Page;
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Upper bound on pages fetched from one chain
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Sequential fetcher for paginated collections.
///
/// Page N+1 is requested only after page N has been decoded, since its link
/// comes from page N. A link that repeats one already visited ends the walk
/// with [`ViewerError::PaginationAnomaly`].
#[derive(Clone, Copy)]
pub struct Paginator<'a> {
    source: &'a dyn DataSource,
    max_pages: usize,
}

struct Cursor {
    next: Option<String>,
    visited: HashSet<String>,
}

impl<'a> Paginator<'a> {
    /// Create a paginator over `source`
    #[must_use]
    pub fn new(source: &'a dyn DataSource) -> Self {
        Self {
            source,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Limit the number of pages one walk may fetch
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Lazily fetch the pages of the chain starting at `start`.
    ///
    /// Pages before an anomaly are still yielded; the anomaly is the final item.
    pub fn pages<T>(&self, start: &str) -> impl Stream<Item = Result<Page<T>>> + 'a
    where
        T: DeserializeOwned + 'a,
    {
        let source = self.source;
        let max_pages = self.max_pages;
        let cursor = Cursor {
            next: Some(start.to_string()),
            visited: HashSet::new(),
        };

        stream::try_unfold(cursor, move |mut cursor| async move {
            let Some(url) = cursor.next.take() else {
                return Ok(None);
            };

            if cursor.visited.contains(&url) {
                warn!("Pagination stopped: {} was already fetched", url);
                return Err(ViewerError::PaginationAnomaly {
                    url,
                    reason: "next link repeats a page already fetched".into(),
                });
            }
            if cursor.visited.len() >= max_pages {
                warn!("Pagination stopped at {} after {} pages", url, max_pages);
                return Err(ViewerError::PaginationAnomaly {
                    url,
                    reason: format!("page limit of {max_pages} reached"),
                });
            }

            debug!("Fetching page {}", url);
            let page: Page<T> = fetch_as(source, &url).await?;
            cursor.next = page.next_link().map(str::to_string);
            cursor.visited.insert(url);

            Ok::<_, ViewerError>(Some((page, cursor)))
        })
    }

    /// Fetch every page and concatenate their items in page order
    pub async fn collect_all<T>(&self, start: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + 'a,
    {
        let mut pages = std::pin::pin!(self.pages::<T>(start));
        let mut items = Vec::new();
        while let Some(page) = pages.try_next().await? {
            items.extend(page.values);
        }
        Ok(items)
    }
}
