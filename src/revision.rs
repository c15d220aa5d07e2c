// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Translating archived Mercurial revisions into mirrored git revisions

use crate::error::{Result, ViewerError};
use crate::source::{fetch_as, DataSource};
use crate::types::{CommitRecord, Project};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Reserved references meaning "the latest revision"
pub const LATEST_ALIASES: [&str; 2] = ["tip", "default"];

/// A revision as written in an archived link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionRef {
    /// One of the "latest" aliases
    Latest,
    /// An opaque native revision identifier
    Native(String),
}

impl RevisionRef {
    /// Classify `reference` against the given aliases
    #[must_use]
    pub fn parse_with<S: AsRef<str>>(reference: &str, aliases: &[S]) -> Self {
        if aliases.iter().any(|alias| alias.as_ref() == reference) {
            Self::Latest
        } else {
            Self::Native(reference.to_string())
        }
    }

    /// Classify `reference` against [`LATEST_ALIASES`]
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        Self::parse_with(reference, &LATEST_ALIASES)
    }
}

/// A revision on the mirrored host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResolvedRevision {
    /// The host's default branch
    Latest,
    /// A specific mirrored commit
    Mirrored(String),
}

/// Looks up the mirrored identifier of an archived revision.
///
/// Only identifiers stored verbatim at export time resolve; abbreviated
/// hashes are not expanded.
pub struct RevisionResolver {
    source: Arc<dyn DataSource>,
    aliases: Vec<String>,
}

impl RevisionResolver {
    /// Create a resolver reading commit records from `source`
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            aliases: LATEST_ALIASES.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Replace the "latest" aliases
    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Path of the commit record for `revision`
    #[must_use]
    pub fn commit_path(project: &Project, revision: &str) -> String {
        project.data_path(&format!("commit/{revision}.json"))
    }

    /// Resolve `reference` within `project`
    pub async fn resolve(&self, project: &Project, reference: &str) -> Result<ResolvedRevision> {
        let revision = match RevisionRef::parse_with(reference, &self.aliases) {
            RevisionRef::Latest => {
                debug!("{} is an alias for the latest revision", reference);
                return Ok(ResolvedRevision::Latest);
            }
            RevisionRef::Native(revision) => revision,
        };

        if revision.is_empty() || revision.contains(['/', '\\', '.']) {
            return Err(ViewerError::RouteResolutionFailure(format!(
                "invalid revision reference: {revision:?}"
            )));
        }

        let path = Self::commit_path(project, &revision);
        debug!("Looking up {} in {}", revision, path);

        let record: CommitRecord = fetch_as(self.source.as_ref(), &path).await.map_err(|e| {
            ViewerError::RouteResolutionFailure(format!(
                "no commit record for {revision} in {}: {e}",
                project.slug
            ))
        })?;

        if let Some(hash) = record.hash.as_deref() {
            if hash != revision {
                return Err(ViewerError::RouteResolutionFailure(format!(
                    "commit record {path} describes {hash}, not {revision}"
                )));
            }
        }

        record
            .git_hash
            .filter(|h| !h.is_empty())
            .map(ResolvedRevision::Mirrored)
            .ok_or_else(|| {
                ViewerError::RouteResolutionFailure(format!(
                    "commit {revision} in {} has no mirrored identifier",
                    project.slug
                ))
            })
    }
}
