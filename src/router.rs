// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Navigation: from a URL to an activated view or an external link
//!
//! A navigation matches the route table, follows static redirects, waits on
//! the bootstrap gate where the route asks for it, runs parameter hooks and
//! finally reports a [`Transition`] to every observer in registration order.

use crate::bootstrap::BootstrapGate;
use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::links::LinkBuilder;
use crate::params::{PageNumberNormalizer, ParamHook, RouteParams};
use crate::revision::RevisionResolver;
use crate::route::{Captures, ComputedRedirect, RenderRoute, RouteOutcome, RouteTable, ViewId};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default limit on chained static redirects
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

// =============================================================================
// Location
// =============================================================================

/// A navigable URL split into path, query and fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Path, always starting with `/`
    pub path: String,
    /// Query string without `?`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Fragment without `#`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl Location {
    /// Parse `/path?query#fragment`; a leading `#!` hashbang prefix is accepted
    #[must_use]
    pub fn parse(url: &str) -> Self {
        let url = url.strip_prefix("#!").unwrap_or(url);

        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self {
            path,
            query: query.filter(|q| !q.is_empty()).map(String::from),
            fragment: fragment.filter(|f| !f.is_empty()).map(String::from),
        }
    }

    /// Same query and fragment on another path
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        Self {
            path: path.to_string(),
            query: self.query.clone(),
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// The state a view is activated with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Activated view
    pub view: ViewId,
    /// Pattern that matched, after redirects
    pub pattern: String,
    /// Coerced parameters
    pub params: RouteParams,
    /// Final location, after redirects
    pub location: Location,
}

/// Outcome of one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A view was (re)activated
    Activated(ViewState),
    /// Only query or fragment changed on a view that keeps its state
    Retained(ViewState),
    /// The browser should leave for this URL
    External(String),
    /// Navigation failed; the view layer shows an error state
    Failed(ViewerError),
}

impl Transition {
    /// The view state, for activated or retained transitions
    #[must_use]
    pub fn view_state(&self) -> Option<&ViewState> {
        match self {
            Self::Activated(state) | Self::Retained(state) => Some(state),
            Self::External(_) | Self::Failed(_) => None,
        }
    }
}

/// Receives every completed transition, after parameter hooks have run
pub trait RouteObserver: Send + Sync {
    /// Called once per navigation
    fn on_transition(&self, transition: &Transition);
}

// =============================================================================
// Router
// =============================================================================

/// Drives navigations against a route table
pub struct Router {
    table: RouteTable,
    gate: Arc<BootstrapGate>,
    resolver: RevisionResolver,
    links: LinkBuilder,
    hooks: Vec<Box<dyn ParamHook>>,
    observers: Vec<Box<dyn RouteObserver>>,
    max_redirects: usize,
    current: Option<ViewState>,
}

impl Router {
    /// Create a router; the page-number normalizer is installed as the first hook
    pub fn new(table: RouteTable, gate: Arc<BootstrapGate>, resolver: RevisionResolver, links: LinkBuilder) -> Self {
        Self {
            table,
            gate,
            resolver,
            links,
            hooks: vec![Box::new(PageNumberNormalizer::default())],
            observers: Vec::new(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            current: None,
        }
    }

    /// Build the archive viewer's router from configuration
    pub fn from_config(config: &ViewerConfig, gate: Arc<BootstrapGate>) -> Result<Self> {
        let resolver = RevisionResolver::new(gate.source().clone()).with_aliases(config.latest_aliases.clone());
        let mut router = Self::new(
            RouteTable::archive_default()?,
            gate,
            resolver,
            LinkBuilder::new(config.default_branch.clone()),
        );
        router.hooks = vec![Box::new(PageNumberNormalizer::new(config.page_params.clone()))];
        router.max_redirects = config.max_redirects;
        Ok(router)
    }

    /// Limit chained static redirects
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Add a parameter hook; hooks run in registration order
    pub fn add_param_hook(&mut self, hook: Box<dyn ParamHook>) {
        self.hooks.push(hook);
    }

    /// Subscribe to transitions; observers run in registration order
    pub fn subscribe(&mut self, observer: Box<dyn RouteObserver>) {
        self.observers.push(observer);
    }

    /// The route table
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The bootstrap gate
    #[must_use]
    pub fn gate(&self) -> &Arc<BootstrapGate> {
        &self.gate
    }

    /// The most recently activated view
    #[must_use]
    pub fn current(&self) -> Option<&ViewState> {
        self.current.as_ref()
    }

    /// Navigate to `url`.
    ///
    /// Failed and external transitions leave the current view untouched.
    pub async fn navigate(&mut self, url: &str) -> Transition {
        let location = Location::parse(url);
        debug!("Navigating to {}", location);

        let transition = match self.resolve(location).await {
            Ok(transition) => transition,
            Err(err) => {
                warn!("Navigation to {} failed: {}", url, err);
                Transition::Failed(err)
            }
        };

        match &transition {
            Transition::Activated(state) => {
                info!("Activated {} at {}", state.view, state.location);
                self.current = Some(state.clone());
            }
            Transition::Retained(state) => {
                debug!("Kept {} at {}", state.view, state.location);
                self.current = Some(state.clone());
            }
            Transition::External(target) => info!("Leaving archive for {}", target),
            Transition::Failed(_) => {}
        }

        for observer in &self.observers {
            observer.on_transition(&transition);
        }
        transition
    }

    async fn resolve(&self, mut location: Location) -> Result<Transition> {
        let mut redirects = 0;

        loop {
            let Some(matched) = self.table.match_path(&location.path) else {
                if location.path == self.table.fallback() {
                    return Err(ViewerError::RouteResolutionFailure(format!(
                        "no route matches the fallback path {}",
                        location.path
                    )));
                }
                debug!("No route for {}, falling back to {}", location.path, self.table.fallback());
                location = self.redirect(&location, self.table.fallback(), &mut redirects)?;
                continue;
            };

            match &matched.route.outcome {
                RouteOutcome::Redirect(target) => {
                    let path = target.build(&matched.captures)?;
                    location = self.redirect(&location, &path, &mut redirects)?;
                }
                RouteOutcome::Render(render) => {
                    let pattern = matched.route.pattern.as_str().to_string();
                    return self.activate(*render, pattern, matched.captures, location).await;
                }
                RouteOutcome::Computed(ComputedRedirect::SourceLink) => {
                    return self.source_link(&matched.captures, &location).await;
                }
            }
        }
    }

    fn redirect(&self, from: &Location, path: &str, redirects: &mut usize) -> Result<Location> {
        *redirects += 1;
        if *redirects > self.max_redirects {
            return Err(ViewerError::RouteResolutionFailure(format!(
                "more than {} redirects while resolving {}",
                self.max_redirects, from.path
            )));
        }
        debug!("Redirect {} -> {}", from.path, path);
        Ok(from.with_path(path))
    }

    async fn activate(
        &self,
        render: RenderRoute,
        pattern: String,
        captures: Captures,
        location: Location,
    ) -> Result<Transition> {
        if render.wait_for_bootstrap {
            self.gate.ready().await?;
        }

        let mut params = RouteParams::from_captured(captures);
        for hook in &self.hooks {
            hook.apply(&mut params);
        }

        let state = ViewState {
            view: render.view,
            pattern,
            params,
            location,
        };

        let keep = !render.reload_on_search
            && self
                .current
                .as_ref()
                .is_some_and(|current| current.pattern == state.pattern && current.location.path == state.location.path);

        Ok(if keep {
            Transition::Retained(state)
        } else {
            Transition::Activated(state)
        })
    }

    async fn source_link(&self, captures: &Captures, location: &Location) -> Result<Transition> {
        let capture = |name: &str| {
            captures.get(name).map(String::as_str).ok_or_else(|| {
                ViewerError::RouteResolutionFailure(format!("source link is missing {name}"))
            })
        };
        let slug = format!("{}/{}", capture("owner")?, capture("project")?);

        let registry = self.gate.ready().await?;
        let project = registry.require(&slug)?;
        let base = LinkBuilder::mirror_base(project)?;

        let revision = self.resolver.resolve(project, capture("revision")?).await?;
        let target = self
            .links
            .blob_url(base, &revision, capture("path")?, location.fragment.as_deref())?;

        Ok(Transition::External(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ProjectRegistry;
    use crate::params::PageNumber;
    use crate::source::MemorySource;
    use crate::types::{Project, ProjectIndexEntry};
    use serde_json::json;
    use std::sync::Mutex;

    fn registry() -> ProjectRegistry {
        ProjectRegistry::new([Project::from_index(
            "owner/alpha".into(),
            ProjectIndexEntry {
                project_path: "data/alpha/".into(),
                project_file: None,
                github_repo: Some("https://github.com/owner/alpha".into()),
            },
            json!({"name": "Alpha"}),
        )])
    }

    fn router(source: Arc<MemorySource>) -> Router {
        let gate = Arc::new(BootstrapGate::preloaded(source.clone(), registry()));
        Router::new(
            RouteTable::archive_default().unwrap(),
            gate,
            RevisionResolver::new(source),
            LinkBuilder::default(),
        )
    }

    #[test]
    fn test_location_parse() {
        let location = Location::parse("#!/o/p/issues/3/page/1?x=1#comment-5");
        assert_eq!(location.path, "/o/p/issues/3/page/1");
        assert_eq!(location.query.as_deref(), Some("x=1"));
        assert_eq!(location.fragment.as_deref(), Some("comment-5"));
        assert_eq!(location.to_string(), "/o/p/issues/3/page/1?x=1#comment-5");

        let bare = Location::parse("o/p#");
        assert_eq!(bare.path, "/o/p");
        assert_eq!(bare.fragment, None);
    }

    #[tokio::test]
    async fn test_redirect_then_render_with_page_number() {
        let mut router = router(Arc::new(MemorySource::new()));

        let transition = router.navigate("/owner/alpha/issues/12").await;

        let state = transition.view_state().unwrap();
        assert_eq!(state.view, ViewId::IssueDetails);
        assert_eq!(state.location.path, "/owner/alpha/issues/12/page/1");
        assert_eq!(state.params.page("pageId"), Some(PageNumber::Number(1)));
        assert_eq!(state.params.text("issueId"), Some("12"));
    }

    #[tokio::test]
    async fn test_redirect_preserves_fragment() {
        let mut router = router(Arc::new(MemorySource::new()));

        let transition = router.navigate("/owner/alpha/issue/4/title#comment-9").await;

        let state = transition.view_state().unwrap();
        assert_eq!(state.location.to_string(), "/owner/alpha/issues/4/page/1#comment-9");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_root() {
        let mut router = router(Arc::new(MemorySource::new()));

        let transition = router.navigate("/owner/alpha/wiki/Home").await;

        assert_eq!(transition.view_state().unwrap().view, ViewId::RepoList);
    }

    #[tokio::test]
    async fn test_fragment_change_retains_detail_view() {
        let mut router = router(Arc::new(MemorySource::new()));

        assert!(matches!(router.navigate("/owner/alpha/issues/1/page/2").await, Transition::Activated(_)));
        assert!(matches!(
            router.navigate("/owner/alpha/issues/1/page/2#comment-3").await,
            Transition::Retained(_)
        ));
        assert!(matches!(router.navigate("/owner/alpha/issues/1/page/3").await, Transition::Activated(_)));
    }

    #[tokio::test]
    async fn test_fragment_change_reloads_list_view() {
        let mut router = router(Arc::new(MemorySource::new()));

        router.navigate("/owner/alpha/issues/page/1").await;
        assert!(matches!(
            router.navigate("/owner/alpha/issues/page/1?sort=id").await,
            Transition::Activated(_)
        ));
    }

    #[tokio::test]
    async fn test_source_link_leaves_archive() {
        let source = Arc::new(MemorySource::new());
        source.insert("data/alpha/commit/abc123.json", json!({"hash": "abc123", "git_hash": "deadbeef"}));
        let mut router = router(source);

        let transition = router.navigate("/owner/alpha/src/abc123/src/file.py#L10-L20").await;

        assert_eq!(
            transition,
            Transition::External("https://github.com/owner/alpha/blob/deadbeef/src/file.py#L20".into())
        );
        assert!(router.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_source_link_keeps_current_view() {
        let mut router = router(Arc::new(MemorySource::new()));
        router.navigate("/owner/alpha").await;

        let transition = router.navigate("/owner/alpha/src/abc123/setup.py").await;

        assert!(matches!(transition, Transition::Failed(ViewerError::RouteResolutionFailure(_))));
        assert_eq!(router.current().unwrap().view, ViewId::IndexPage);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_reported() {
        let mut table = RouteTable::new();
        table
            .redirect("/a/:x", "/b/:x")
            .unwrap()
            .redirect("/b/:x", "/a/:x")
            .unwrap();
        let source = Arc::new(MemorySource::new());
        let gate = Arc::new(BootstrapGate::preloaded(source.clone(), registry()));
        let mut router = Router::new(table, gate, RevisionResolver::new(source), LinkBuilder::default())
            .with_max_redirects(4);

        let transition = router.navigate("/a/1").await;

        assert!(matches!(transition, Transition::Failed(ViewerError::RouteResolutionFailure(_))));
    }

    #[tokio::test]
    async fn test_empty_table_reports_unmatched_fallback() {
        let source = Arc::new(MemorySource::new());
        let gate = Arc::new(BootstrapGate::preloaded(source.clone(), registry()));
        let mut router = Router::new(RouteTable::new(), gate, RevisionResolver::new(source), LinkBuilder::default());

        assert!(matches!(router.navigate("/anything").await, Transition::Failed(_)));
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl RouteObserver for Recorder {
        fn on_transition(&self, transition: &Transition) {
            let entry = match transition {
                Transition::Activated(state) => format!("activated:{}", state.params.page("pageId").unwrap()),
                Transition::Retained(_) => "retained".into(),
                Transition::External(url) => format!("external:{url}"),
                Transition::Failed(err) => format!("failed:{}", err.kind()),
            };
            self.0.lock().unwrap().push(entry);
        }
    }

    struct Tag(&'static str);

    impl ParamHook for Tag {
        fn apply(&self, params: &mut RouteParams) {
            // runs after the normalizer, so the page is already numeric
            assert!(params.page("pageId").is_some());
            params.insert("tag", crate::params::ParamValue::Text(self.0.into()));
        }
    }

    #[tokio::test]
    async fn test_hooks_run_before_observers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = router(Arc::new(MemorySource::new()));
        router.add_param_hook(Box::new(Tag("x")));
        router.subscribe(Box::new(Recorder(seen.clone())));

        let transition = router.navigate("/owner/alpha/pull-requests/page/7").await;

        assert_eq!(transition.view_state().unwrap().params.text("tag"), Some("x"));
        assert_eq!(seen.lock().unwrap().as_slice(), ["activated:7"]);
    }
}
