// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! View-model loaders for activated views
//!
//! Required documents (the issue, its comment page, ...) fail the view.
//! Optional sub-resources degrade: a missing change set is an empty object,
//! missing attachments are an empty list, and a pull request whose commits
//! cannot be mapped simply has no diff link.

use crate::bootstrap::ProjectRegistry;
use crate::error::{FetchError, Result, ViewerError};
use crate::links::{sidebar_links, LinkBuilder, SidebarLink};
use crate::pagination::{Paginator, DEFAULT_MAX_PAGES};
use crate::params::PageNumber;
use crate::router::ViewState;
use crate::route::ViewId;
use crate::source::{fetch_as, DataSource};
use crate::types::{CommitRecord, Page, Project};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pull request states the exporter requested when listing
const PULL_REQUEST_STATES: &str = "state=MERGED&state=OPEN&state=SUPERSEDED&state=DECLINED";

/// Project fields every view shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    /// `owner/name` slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Description, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Mirrored repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_url: Option<String>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            slug: project.slug.clone(),
            name: project.name().to_string(),
            description: project.description().map(String::from),
            mirror_url: project.mirror_url.clone(),
        }
    }
}

/// An issue with one page of comments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDetails {
    /// Project summary
    pub project: ProjectSummary,
    /// Comment page shown
    pub page: PageNumber,
    /// The issue document
    pub issue: Value,
    /// Comments, each with a `changes` object attached
    pub comments: Page<Value>,
    /// Every attachment, across all attachment pages
    pub attachments: Vec<Value>,
}

/// A pull request with one page of comments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestDetails {
    /// Project summary
    pub project: ProjectSummary,
    /// Comment page shown
    pub page: PageNumber,
    /// The pull request document
    pub pull_request: Value,
    /// Comments
    pub comments: Page<Value>,
    /// Diff on the mirrored host, when both commits map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_url: Option<String>,
}

/// A commit with one page of comments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitDetails {
    /// Project summary
    pub project: ProjectSummary,
    /// Comment page shown
    pub page: PageNumber,
    /// The commit document
    pub commit: Value,
    /// Comments
    pub comments: Page<Value>,
}

/// Data for one activated view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum ViewModel {
    /// All projects
    RepoList {
        /// Projects in slug order
        projects: Vec<ProjectSummary>,
    },
    /// A project's landing page
    IndexPage {
        /// Project summary
        project: ProjectSummary,
        /// Sidebar navigation
        links: Vec<SidebarLink>,
    },
    /// One page of issues
    IssuesList {
        /// Project summary
        project: ProjectSummary,
        /// Page shown
        page: PageNumber,
        /// Issues on the page
        issues: Page<Value>,
    },
    /// One page of pull requests
    #[serde(rename = "pullrequests-list")]
    PullRequestsList {
        /// Project summary
        project: ProjectSummary,
        /// Page shown
        page: PageNumber,
        /// Pull requests on the page
        pull_requests: Page<Value>,
    },
    /// Issue details
    IssueDetails(IssueDetails),
    /// Pull request details
    #[serde(rename = "pullrequest-details")]
    PullRequestDetails(PullRequestDetails),
    /// Commit details
    CommitDetails(CommitDetails),
}

/// Fetches the documents an activated view needs
pub struct ViewLoader {
    source: Arc<dyn DataSource>,
    registry: Arc<ProjectRegistry>,
    max_pages: usize,
}

impl ViewLoader {
    /// Create a loader over a bootstrapped registry
    pub fn new(source: Arc<dyn DataSource>, registry: Arc<ProjectRegistry>) -> Self {
        Self {
            source,
            registry,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Limit pages fetched for paginated sub-resources
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Load the view model for `state`
    pub async fn load(&self, state: &ViewState) -> Result<ViewModel> {
        if state.view == ViewId::RepoList {
            return Ok(ViewModel::RepoList {
                projects: self.registry.iter().map(ProjectSummary::from).collect(),
            });
        }

        let slug = state.params.project_slug().ok_or_else(|| {
            ViewerError::RouteResolutionFailure(format!("{} needs owner and project", state.view))
        })?;
        let project = self.registry.require(&slug)?;

        match state.view {
            ViewId::RepoList | ViewId::IndexPage => Ok(ViewModel::IndexPage {
                project: project.into(),
                links: sidebar_links(project),
            }),
            ViewId::IssuesList => {
                let page = page_param(state)?;
                let issues = self.required(&project.data_path(&format!("issues_page={page}.json"))).await?;
                Ok(ViewModel::IssuesList {
                    project: project.into(),
                    page: PageNumber::Number(page),
                    issues,
                })
            }
            ViewId::PullRequestsList => {
                let page = page_param(state)?;
                let path = project.data_path(&format!("pullrequests_{PULL_REQUEST_STATES}&page={page}.json"));
                Ok(ViewModel::PullRequestsList {
                    project: project.into(),
                    page: PageNumber::Number(page),
                    pull_requests: self.required(&path).await?,
                })
            }
            ViewId::IssueDetails => Ok(ViewModel::IssueDetails(self.issue_details(project, state).await?)),
            ViewId::PullRequestDetails => Ok(ViewModel::PullRequestDetails(
                self.pull_request_details(project, state).await?,
            )),
            ViewId::CommitDetails => Ok(ViewModel::CommitDetails(self.commit_details(project, state).await?)),
        }
    }

    async fn issue_details(&self, project: &Project, state: &ViewState) -> Result<IssueDetails> {
        let id = text_param(state, "issueId")?;
        let page = page_param(state)?;
        let base = project.data_path(&format!("issues/{id}"));

        let issue = self.required(&format!("{base}.json")).await?;
        let mut comments: Page<Value> = self.required(&format!("{base}/comments_page={page}.json")).await?;

        let changes = join_all(comments.values.iter().map(|comment| {
            let comment_id = comment.get("id").map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            let base = base.as_str();
            async move {
                match comment_id {
                    Some(comment_id) => self.optional(&format!("{base}/changes/{comment_id}.json")).await,
                    None => Value::Object(Map::new()),
                }
            }
        }))
        .await;

        for (comment, change) in comments.values.iter_mut().zip(changes) {
            if let Value::Object(fields) = comment {
                fields.insert("changes".to_string(), change);
            }
        }

        let attachments = match Paginator::new(self.source.as_ref())
            .with_max_pages(self.max_pages)
            .collect_all::<Value>(&format!("{base}/attachments_page=1.json"))
            .await
        {
            Ok(attachments) => attachments,
            Err(ViewerError::Fetch(err)) => {
                degraded(&err);
                Vec::new()
            }
            Err(other) => return Err(other),
        };

        Ok(IssueDetails {
            project: project.into(),
            page: PageNumber::Number(page),
            issue,
            comments,
            attachments,
        })
    }

    async fn pull_request_details(&self, project: &Project, state: &ViewState) -> Result<PullRequestDetails> {
        let id = text_param(state, "prId")?;
        let page = page_param(state)?;
        let base = project.data_path(&format!("pullrequests/{id}"));

        let pull_request: Value = self.required(&format!("{base}.json")).await?;
        let comments = self.required(&format!("{base}/comments_page={page}.json")).await?;

        let diff_url = match project.mirror_url.as_deref() {
            Some(mirror) => self.diff_url(mirror, &pull_request).await,
            None => None,
        };

        Ok(PullRequestDetails {
            project: project.into(),
            page: PageNumber::Number(page),
            pull_request,
            comments,
            diff_url,
        })
    }

    /// Compare link between the destination commit and the merge commit
    async fn diff_url(&self, mirror: &str, pull_request: &Value) -> Option<String> {
        let href = |commit: &str| {
            pull_request
                .pointer(&format!("{commit}/links/self/href"))
                .and_then(Value::as_str)
                .map(String::from)
        };
        let destination = href("/destination/commit");
        let merge = href("/merge_commit");
        let (Some(destination), Some(merge)) = (destination, merge) else {
            debug!("Pull request has no destination or merge commit link");
            return None;
        };

        let source = self.source.as_ref();
        let (destination, merge) = futures::join!(
            fetch_as::<CommitRecord>(source, &destination),
            fetch_as::<CommitRecord>(source, &merge),
        );
        match (destination, merge) {
            (Ok(destination), Ok(merge)) => match (destination.git_hash, merge.git_hash) {
                (Some(from), Some(to)) => Some(LinkBuilder::compare_url(mirror, &from, &to)),
                _ => {
                    debug!("Pull request commits have no mirrored identifiers");
                    None
                }
            },
            (Err(err), _) | (_, Err(err)) => {
                degraded(&err);
                None
            }
        }
    }

    async fn commit_details(&self, project: &Project, state: &ViewState) -> Result<CommitDetails> {
        let slug = text_param(state, "commitSlug")?;
        let page = page_param(state)?;
        let base = project.data_path(&format!("commit/{slug}"));

        Ok(CommitDetails {
            project: project.into(),
            page: PageNumber::Number(page),
            commit: self.required(&format!("{base}.json")).await?,
            comments: self.required(&format!("{base}/comments_page={page}.json")).await?,
        })
    }

    async fn required<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(fetch_as(self.source.as_ref(), path).await?)
    }

    async fn optional(&self, path: &str) -> Value {
        match self.source.fetch_json(path).await {
            Ok(value) => value,
            Err(err) => {
                degraded(&err);
                Value::Object(Map::new())
            }
        }
    }
}

fn degraded(err: &FetchError) {
    if err.is_not_found() {
        debug!("Optional resource absent: {}", err);
    } else {
        warn!("Optional resource unavailable: {}", err);
    }
}

fn text_param<'s>(state: &'s ViewState, name: &str) -> Result<&'s str> {
    state.params.text(name).ok_or_else(|| {
        ViewerError::RouteResolutionFailure(format!("{} needs parameter {name}", state.view))
    })
}

/// The comment or list page a view shows; views without one show page 1
fn page_param(state: &ViewState) -> Result<i64> {
    match state.params.page("pageId").or_else(|| state.params.page("page")) {
        Some(PageNumber::Number(page)) => Ok(page),
        Some(PageNumber::NotANumber) => Err(ViewerError::Fetch(FetchError::InvalidPath(format!(
            "{} page is not a number",
            state.location.path
        )))),
        None => Ok(1),
    }
}
