// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Route patterns and the ordered route table
//!
//! Patterns are `/`-separated segments: literals, `:name` parameters, one
//! optional trailing `:name?` parameter, or a trailing `*name` catch-all that
//! captures the rest of the path including slashes.

use crate::error::{Result, ViewerError};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Captured parameter values by name
pub type Captures = BTreeMap<String, String>;

// =============================================================================
// Pattern
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Optional(String),
    CatchAll(String),
}

/// A parsed URL pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern such as `/:owner/:project/src/:revision/*path`
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| ViewerError::ConfigurationError(format!("route pattern {pattern}: {reason}"));

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let body = pattern.trim_start_matches('/').trim_end_matches('/');
        let mut segments = Vec::new();
        let mut names = HashSet::new();

        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            for (i, part) in parts.iter().enumerate() {
                let last = i + 1 == parts.len();
                let segment = if let Some(name) = part.strip_prefix('*') {
                    if !last {
                        return Err(invalid("catch-all must be the last segment"));
                    }
                    Segment::CatchAll(name.to_string())
                } else if let Some(name) = part.strip_prefix(':') {
                    match name.strip_suffix('?') {
                        Some(name) if last => Segment::Optional(name.to_string()),
                        Some(_) => return Err(invalid("optional parameter must be the last segment")),
                        None => Segment::Param(name.to_string()),
                    }
                } else if part.is_empty() {
                    return Err(invalid("empty segment"));
                } else {
                    Segment::Literal((*part).to_string())
                };

                if let Segment::Param(name) | Segment::Optional(name) | Segment::CatchAll(name) = &segment {
                    if name.is_empty() {
                        return Err(invalid("unnamed parameter"));
                    }
                    if !names.insert(name.clone()) {
                        return Err(invalid(&format!("duplicate parameter {name}")));
                    }
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of all parameters the pattern captures
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(n) | Segment::Optional(n) | Segment::CatchAll(n) => Some(n.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Names of the parameters a path must supply
    fn required_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(n) | Segment::CatchAll(n) => Some(n.as_str()),
            Segment::Literal(_) | Segment::Optional(_) => None,
        })
    }

    /// Match a location path, returning captures on success.
    ///
    /// A single trailing `/` on the path is ignored.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let parts = split_path(path);
        let mut captures = Captures::new();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                    i += 1;
                }
                Segment::Param(name) => {
                    let part = parts.get(i).filter(|p| !p.is_empty())?;
                    captures.insert(name.clone(), (*part).to_string());
                    i += 1;
                }
                Segment::Optional(name) => {
                    if let Some(part) = parts.get(i) {
                        if part.is_empty() {
                            return None;
                        }
                        captures.insert(name.clone(), (*part).to_string());
                        i += 1;
                    }
                }
                Segment::CatchAll(name) => {
                    let rest = &parts[i.min(parts.len())..];
                    if rest.iter().all(|p| p.is_empty()) {
                        return None;
                    }
                    captures.insert(name.clone(), rest.join("/"));
                    i = parts.len();
                }
            }
        }

        (i == parts.len()).then_some(captures)
    }

    /// Substitute captures into this pattern to produce a path
    pub fn build(&self, captures: &Captures) -> Result<String> {
        let mut path = String::new();
        for segment in &self.segments {
            let piece = match segment {
                Segment::Literal(literal) => literal.as_str(),
                Segment::Param(name) | Segment::CatchAll(name) => {
                    captures.get(name).map(String::as_str).ok_or_else(|| {
                        ViewerError::RouteResolutionFailure(format!(
                            "redirect {} needs parameter {name}",
                            self.source
                        ))
                    })?
                }
                Segment::Optional(name) => match captures.get(name) {
                    Some(value) => value.as_str(),
                    None => continue,
                },
            };
            path.push('/');
            path.push_str(piece);
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Views the archive viewer can activate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewId {
    /// All archived projects
    RepoList,
    /// One project's landing page
    IndexPage,
    /// Paginated issues of a project
    IssuesList,
    /// One issue with a page of comments
    IssueDetails,
    /// Paginated pull requests of a project
    #[serde(rename = "pullrequests-list")]
    PullRequestsList,
    /// One pull request with a page of comments
    #[serde(rename = "pullrequest-details")]
    PullRequestDetails,
    /// One commit with a page of comments
    CommitDetails,
}

impl ViewId {
    /// Name of the view component
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RepoList => "repo-list",
            Self::IndexPage => "index-page",
            Self::IssuesList => "issues-list",
            Self::IssueDetails => "issue-details",
            Self::PullRequestsList => "pullrequests-list",
            Self::PullRequestDetails => "pullrequest-details",
            Self::CommitDetails => "commit-details",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activate a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRoute {
    /// View to activate
    pub view: ViewId,
    /// Hold activation until bootstrap has completed
    pub wait_for_bootstrap: bool,
    /// Re-render when only the query or fragment changes
    pub reload_on_search: bool,
}

impl RenderRoute {
    /// Render `view` after bootstrap, reloading on search changes
    #[must_use]
    pub fn new(view: ViewId) -> Self {
        Self {
            view,
            wait_for_bootstrap: true,
            reload_on_search: true,
        }
    }

    /// Do not wait for bootstrap
    #[must_use]
    pub fn without_bootstrap(mut self) -> Self {
        self.wait_for_bootstrap = false;
        self
    }

    /// Keep the active view when only query or fragment change
    #[must_use]
    pub fn keep_on_search(mut self) -> Self {
        self.reload_on_search = false;
        self
    }
}

/// Redirects computed from archive data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComputedRedirect {
    /// Translate an archived source link to the mirrored host.
    /// Needs `owner`, `project`, `revision` and `path` captures.
    SourceLink,
}

/// What a matched route does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Activate a view
    Render(RenderRoute),
    /// Rewrite the path and match again
    Redirect(Pattern),
    /// Leave the archive for a URL computed from data
    Computed(ComputedRedirect),
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(render) => {
                write!(f, "render {}", render.view)?;
                if !render.reload_on_search {
                    f.write_str(" (keep on search)")?;
                }
                Ok(())
            }
            Self::Redirect(target) => write!(f, "redirect {target}"),
            Self::Computed(ComputedRedirect::SourceLink) => f.write_str("computed source-link"),
        }
    }
}

// =============================================================================
// Route Table
// =============================================================================

/// One rule of the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Pattern the path must match
    pub pattern: Pattern,
    /// What happens on a match
    pub outcome: RouteOutcome,
}

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Position of the rule in the table
    pub index: usize,
    /// The matching rule
    pub route: &'a Route,
    /// Captured parameters
    pub captures: Captures,
}

/// Ordered route rules; the first matching pattern wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Create an empty table falling back to `/`
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: "/".to_string(),
        }
    }

    /// Append a route that activates a view
    pub fn render(&mut self, pattern: &str, render: RenderRoute) -> Result<&mut Self> {
        self.push(pattern, RouteOutcome::Render(render))
    }

    /// Append a static redirect; `target` may only use parameters `pattern` captures
    pub fn redirect(&mut self, pattern: &str, target: &str) -> Result<&mut Self> {
        let source = Pattern::parse(pattern)?;
        let target = Pattern::parse(target)?;
        let captured: HashSet<&str> = source.param_names().collect();
        if let Some(missing) = target.required_names().find(|n| !captured.contains(n)) {
            return Err(ViewerError::ConfigurationError(format!(
                "redirect {pattern} -> {target} uses uncaptured parameter {missing}"
            )));
        }
        self.routes.push(Route {
            pattern: source,
            outcome: RouteOutcome::Redirect(target),
        });
        Ok(self)
    }

    /// Append a computed redirect
    pub fn computed(&mut self, pattern: &str, redirect: ComputedRedirect) -> Result<&mut Self> {
        let parsed = Pattern::parse(pattern)?;
        let required = match redirect {
            ComputedRedirect::SourceLink => ["owner", "project", "revision", "path"],
        };
        let captured: HashSet<&str> = parsed.required_names().collect();
        if let Some(missing) = required.iter().find(|n| !captured.contains(*n)) {
            return Err(ViewerError::ConfigurationError(format!(
                "computed route {pattern} must capture {missing}"
            )));
        }
        self.routes.push(Route {
            pattern: parsed,
            outcome: RouteOutcome::Computed(redirect),
        });
        Ok(self)
    }

    /// Path to navigate to when nothing matches
    pub fn otherwise(&mut self, fallback: &str) -> &mut Self {
        self.fallback = fallback.to_string();
        self
    }

    fn push(&mut self, pattern: &str, outcome: RouteOutcome) -> Result<&mut Self> {
        self.routes.push(Route {
            pattern: Pattern::parse(pattern)?,
            outcome,
        });
        Ok(self)
    }

    /// Routes in evaluation order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Fallback path
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Find the first route whose pattern matches `path`
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().enumerate().find_map(|(index, route)| {
            route.pattern.matches(path).map(|captures| RouteMatch {
                index,
                route,
                captures,
            })
        })
    }

    /// The archive viewer's route table
    pub fn archive_default() -> Result<Self> {
        use ViewId::*;

        let mut table = Self::new();
        table
            .render("/", RenderRoute::new(RepoList))?
            .render("/:owner/:project", RenderRoute::new(IndexPage))?
            // issues list
            .redirect("/:owner/:project/issues", "/:owner/:project/issues/page/1")?
            .render("/:owner/:project/issues/page/:pageId", RenderRoute::new(IssuesList))?
            // issue details
            .render(
                "/:owner/:project/issues/:issueId/page/:pageId",
                RenderRoute::new(IssueDetails).keep_on_search(),
            )?
            .redirect("/:owner/:project/issues/:issueId", "/:owner/:project/issues/:issueId/page/1")?
            .redirect("/:owner/:project/issues/:issueId/:slug", "/:owner/:project/issues/:issueId/page/1")?
            .redirect("/:owner/:project/issue/:issueId", "/:owner/:project/issues/:issueId/page/1")?
            .redirect(
                "/:owner/:project/issue/:issueId/page/:pageId",
                "/:owner/:project/issues/:issueId/page/:pageId",
            )?
            .redirect("/:owner/:project/issue/:issueId/:slug", "/:owner/:project/issues/:issueId/page/1")?
            // pull requests list
            .render(
                "/:owner/:project/pull-requests/page/:pageId",
                RenderRoute::new(PullRequestsList).keep_on_search(),
            )?
            .redirect("/:owner/:project/pull-requests", "/:owner/:project/pull-requests/page/1")?
            // pull request details
            .render(
                "/:owner/:project/pull-requests/:prId/page/:pageId",
                RenderRoute::new(PullRequestDetails).keep_on_search(),
            )?
            .redirect("/:owner/:project/pull-requests/:prId", "/:owner/:project/pull-requests/:prId/page/1")?
            .redirect(
                "/:owner/:project/pull-requests/:prId/:slug",
                "/:owner/:project/pull-requests/:prId/page/1",
            )?
            // commit details
            .render(
                "/:owner/:project/commits/:commitSlug/page/:pageId",
                RenderRoute::new(CommitDetails).keep_on_search(),
            )?
            .redirect("/:owner/:project/commits/:commitSlug", "/:owner/:project/commits/:commitSlug/page/1")?
            // source links leave the archive
            .computed("/:owner/:project/src/:revision/*path", ComputedRedirect::SourceLink)?
            .otherwise("/");

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(pairs: &[(&str, &str)]) -> Captures {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_literal_and_params() {
        let pattern = Pattern::parse("/:owner/:project/issues/page/:pageId").unwrap();

        assert_eq!(
            pattern.matches("/o/p/issues/page/3"),
            Some(caps(&[("owner", "o"), ("project", "p"), ("pageId", "3")]))
        );
        assert_eq!(pattern.matches("/o/p/issues/page/3/"), pattern.matches("/o/p/issues/page/3"));
        assert!(pattern.matches("/o/p/issues/page").is_none());
        assert!(pattern.matches("/o/p/issues/page/3/extra").is_none());
        assert!(pattern.matches("/o/p/pulls/page/3").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let root = Pattern::parse("/").unwrap();
        assert_eq!(root.matches("/"), Some(Captures::new()));
        assert_eq!(root.matches(""), Some(Captures::new()));
        assert!(root.matches("/x").is_none());
    }

    #[test]
    fn test_empty_segment_does_not_bind_param() {
        let pattern = Pattern::parse("/:owner/:project").unwrap();
        assert!(pattern.matches("//p").is_none());
    }

    #[test]
    fn test_optional_trailing_param() {
        let pattern = Pattern::parse("/issue/:issueId/page/:pageId?").unwrap();

        assert_eq!(pattern.matches("/issue/4/page/2"), Some(caps(&[("issueId", "4"), ("pageId", "2")])));
        assert_eq!(pattern.matches("/issue/4/page"), Some(caps(&[("issueId", "4")])));
        assert!(pattern.matches("/issue/4/page/2/3").is_none());
    }

    #[test]
    fn test_catch_all_keeps_slashes() {
        let pattern = Pattern::parse("/:owner/:project/src/:revision/*path").unwrap();

        let captured = pattern.matches("/o/p/src/abc123/src/pkg/file.py").unwrap();
        assert_eq!(captured["revision"], "abc123");
        assert_eq!(captured["path"], "src/pkg/file.py");

        assert!(pattern.matches("/o/p/src/abc123").is_none());
        assert!(pattern.matches("/o/p/src/abc123/").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(Pattern::parse("no-slash").is_err());
        assert!(Pattern::parse("/*rest/more").is_err());
        assert!(Pattern::parse("/:a?/b").is_err());
        assert!(Pattern::parse("/:a/:a").is_err());
        assert!(Pattern::parse("/:").is_err());
        assert!(Pattern::parse("/a//b").is_err());
    }

    #[test]
    fn test_build_substitutes_captures() {
        let target = Pattern::parse("/:owner/:project/issues/:issueId/page/1").unwrap();
        let path = target
            .build(&caps(&[("owner", "o"), ("project", "p"), ("issueId", "9"), ("slug", "x")]))
            .unwrap();
        assert_eq!(path, "/o/p/issues/9/page/1");

        let missing = target.build(&caps(&[("owner", "o")]));
        assert!(matches!(missing, Err(ViewerError::RouteResolutionFailure(_))));

        assert_eq!(Pattern::parse("/").unwrap().build(&Captures::new()).unwrap(), "/");
    }

    #[test]
    fn test_redirect_must_use_captured_params() {
        let mut table = RouteTable::new();
        let err = table.redirect("/:owner/issues", "/:owner/:project/issues").unwrap_err();
        assert!(matches!(err, ViewerError::ConfigurationError(_)));
    }

    #[test]
    fn test_computed_route_requires_captures() {
        let mut table = RouteTable::new();
        assert!(table
            .computed("/:owner/:project/src/:revision", ComputedRedirect::SourceLink)
            .is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = RouteTable::new();
        table
            .render("/:owner/:project/issues/:issueId", RenderRoute::new(ViewId::IssueDetails))
            .unwrap()
            .render("/:owner/:project/issues/page", RenderRoute::new(ViewId::IssuesList))
            .unwrap();

        let matched = table.match_path("/o/p/issues/page").unwrap();
        assert_eq!(matched.index, 0);
        assert_eq!(matched.captures["issueId"], "page");
    }

    #[test]
    fn test_default_table_ordering() {
        let table = RouteTable::archive_default().unwrap();

        // "page" is a literal in the list route declared before issue details
        let list = table.match_path("/o/p/issues/page/2").unwrap();
        assert_eq!(list.route.outcome, RouteOutcome::Render(RenderRoute::new(ViewId::IssuesList)));

        let slugged = table.match_path("/o/p/issues/12/some-title").unwrap();
        assert!(matches!(slugged.route.outcome, RouteOutcome::Redirect(_)));

        let source = table.match_path("/o/p/src/tip/README.rst").unwrap();
        assert_eq!(source.route.outcome, RouteOutcome::Computed(ComputedRedirect::SourceLink));

        assert!(table.match_path("/o/p/wiki").is_none());
        assert_eq!(table.fallback(), "/");
    }

    #[test]
    fn test_view_id_names_match_serde() {
        for view in [
            ViewId::RepoList,
            ViewId::IndexPage,
            ViewId::IssuesList,
            ViewId::IssueDetails,
            ViewId::PullRequestsList,
            ViewId::PullRequestDetails,
            ViewId::CommitDetails,
        ] {
            assert_eq!(serde_json::to_value(view).unwrap(), view.as_str());
        }
    }
}
