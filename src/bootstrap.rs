// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Bootstrap gate and the project registry it produces

use crate::error::{Result, ViewerError};
use crate::source::{fetch_as, DataSource};
use crate::types::{Project, ProjectIndex};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Default location of the project index inside an export
pub const DEFAULT_INDEX_FILE: &str = "repos.json";

/// Read-only registry of archived projects, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: BTreeMap<String, Project>,
}

impl ProjectRegistry {
    /// Build a registry from loaded projects
    pub fn new(projects: impl IntoIterator<Item = Project>) -> Self {
        Self {
            projects: projects.into_iter().map(|p| (p.slug.clone(), p)).collect(),
        }
    }

    /// Look up a project by slug
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&Project> {
        self.projects.get(slug)
    }

    /// Look up a project a route refers to
    pub fn require(&self, slug: &str) -> Result<&Project> {
        self.get(slug)
            .ok_or_else(|| ViewerError::RouteResolutionFailure(format!("unknown project: {slug}")))
    }

    /// All projects in slug order
    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Number of projects
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the archive lists no projects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Loads the project index and every project's metadata exactly once.
///
/// The outcome, success or failure, is memoised: later waiters get the same
/// registry or the same error and nothing is fetched again.
pub struct BootstrapGate {
    source: Arc<dyn DataSource>,
    index_path: String,
    state: OnceCell<Result<Arc<ProjectRegistry>>>,
}

impl BootstrapGate {
    /// Create a gate that will read `index_path` from `source`
    pub fn new(source: Arc<dyn DataSource>, index_path: impl Into<String>) -> Self {
        Self {
            source,
            index_path: index_path.into(),
            state: OnceCell::new(),
        }
    }

    /// Create a gate that is already open with `registry`
    pub fn preloaded(source: Arc<dyn DataSource>, registry: ProjectRegistry) -> Self {
        Self {
            source,
            index_path: DEFAULT_INDEX_FILE.to_string(),
            state: OnceCell::new_with(Some(Ok(Arc::new(registry)))),
        }
    }

    /// Wait for bootstrap, starting it on first call
    pub async fn ready(&self) -> Result<Arc<ProjectRegistry>> {
        self.state.get_or_init(|| self.load()).await.clone()
    }

    /// Whether bootstrap has finished, successfully or not
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.initialized()
    }

    /// The source the gate reads from
    #[must_use]
    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    async fn load(&self) -> Result<Arc<ProjectRegistry>> {
        info!("Loading project index from {}", self.index_path);

        let index: ProjectIndex = fetch_as(self.source.as_ref(), &self.index_path)
            .await
            .map_err(|source| {
                warn!("Project index unavailable: {}", source);
                ViewerError::BootstrapFailure {
                    resource: self.index_path.clone(),
                    source,
                }
            })?;

        let source = self.source.as_ref();
        let loads = index.into_iter().map(|(slug, entry)| async move {
            let path = entry.metadata_path();
            debug!("Loading metadata for {} from {}", slug, path);
            let metadata = source.fetch_json(&path).await.map_err(|source| {
                warn!("Metadata for {} unavailable: {}", slug, source);
                ViewerError::BootstrapFailure {
                    resource: format!("{slug} ({path})"),
                    source,
                }
            })?;
            Ok::<_, ViewerError>(Project::from_index(slug, entry, metadata))
        });

        let projects = try_join_all(loads).await?;
        info!("Bootstrap complete: {} projects", projects.len());

        Ok(Arc::new(ProjectRegistry::new(projects)))
    }
}
