// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Links out of the archive to the mirrored live repository

use crate::error::{Result, ViewerError};
use crate::revision::ResolvedRevision;
use crate::types::Project;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// Branch used for "latest" links when none is configured
pub const DEFAULT_BRANCH: &str = "master";

/// Builds URLs on the mirrored host
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    default_branch: String,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCH)
    }
}

impl LinkBuilder {
    /// Create a builder mapping "latest" to `default_branch`
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            default_branch: default_branch.into(),
        }
    }

    /// Branch name used for the latest revision
    #[must_use]
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// The project's mirrored base URL, validated
    pub fn mirror_base(project: &Project) -> Result<&str> {
        let base = project.mirror_url.as_deref().ok_or_else(|| {
            ViewerError::ConfigurationError(format!("project {} has no mirrored repository", project.slug))
        })?;

        match Url::parse(base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(base),
            Ok(url) => Err(ViewerError::ConfigurationError(format!(
                "mirrored repository of {} uses unsupported scheme {}",
                project.slug,
                url.scheme()
            ))),
            Err(e) => Err(ViewerError::ConfigurationError(format!(
                "mirrored repository of {} is not a valid URL ({base}): {e}",
                project.slug
            ))),
        }
    }

    /// `<base>/blob/<revision>/<path>[#L<line>]`
    pub fn blob_url(
        &self,
        mirror_base: &str,
        revision: &ResolvedRevision,
        path: &str,
        fragment: Option<&str>,
    ) -> Result<String> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ViewerError::RouteResolutionFailure("source link has no file path".into()));
        }

        let revision = match revision {
            ResolvedRevision::Latest => self.default_branch.as_str(),
            ResolvedRevision::Mirrored(hash) => hash.as_str(),
        };

        let mut url = format!("{}/blob/{}/{}", mirror_base.trim_end_matches('/'), revision, path);
        if let Some(line) = fragment.and_then(anchor_line) {
            url.push_str(&format!("#L{line}"));
        }
        Ok(url)
    }

    /// `<base>/compare/<from>..<to>`
    #[must_use]
    pub fn compare_url(mirror_base: &str, from: &str, to: &str) -> String {
        format!("{}/compare/{}..{}", mirror_base.trim_end_matches('/'), from, to)
    }
}

/// Target line of an anchor such as `L10-L20`, `cl-321` or `lines-4:9`.
///
/// The fragment is split on `-` and the last token's trailing digits name the
/// line, so a range links to its end.
#[must_use]
pub fn anchor_line(fragment: &str) -> Option<u64> {
    let fragment = fragment.trim_start_matches('#');
    let token = fragment.rsplit('-').next()?;
    let digits = &token[token.trim_end_matches(|c: char| c.is_ascii_digit()).len()..];
    let line = digits.parse().ok();
    if line.is_none() && !fragment.is_empty() {
        debug!("Anchor {:?} has no line number", fragment);
    }
    line
}

/// A navigation link shown beside every project page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarLink {
    /// Link text
    pub text: String,
    /// Target, in-archive (`#!/...`) or absolute
    pub url: String,
}

/// Navigation links for a project's pages
#[must_use]
pub fn sidebar_links(project: &Project) -> Vec<SidebarLink> {
    let link = |text: &str, url: String| SidebarLink { text: text.into(), url };
    let mut links = vec![
        link("Home", format!("#!/{}", project.slug)),
        link("Issues", format!("#!/{}/issues", project.slug)),
        link("Pull Requests", format!("#!/{}/pull-requests", project.slug)),
    ];
    if let Some(mirror) = &project.mirror_url {
        links.push(link("GitHub repository", mirror.clone()));
    }
    links
}
