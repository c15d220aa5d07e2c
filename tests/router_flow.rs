// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end navigation over an export directory on disk

use archive_router::bootstrap::BootstrapGate;
use archive_router::config::ViewerConfig;
use archive_router::router::{RouteObserver, Router, Transition};
use archive_router::source::FsSource;
use archive_router::views::{ViewLoader, ViewModel};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn write(root: &Path, path: &str, value: &Value) {
    let file = root.join(path);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(file, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// A small export: one mirrored project with issues, a pull request and commits
fn export() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let base = "data/repositories/owner/alpha";

    write(
        root,
        "repos.json",
        &json!({
            "owner/alpha": {
                "project_file": "data/repositories/owner/alpha.json",
                "project_path": "data/repositories/owner/alpha/",
                "github_repo": "https://github.com/owner/alpha"
            }
        }),
    );
    write(root, "data/repositories/owner/alpha.json", &json!({"name": "alpha", "description": "An archived project"}));

    write(root, &format!("{base}/issues_page=1.json"), &json!({"values": [{"id": 1, "title": "Crash"}], "page": 1}));
    write(root, &format!("{base}/issues/1.json"), &json!({"id": 1, "title": "Crash"}));
    write(root, &format!("{base}/issues/1/comments_page=1.json"), &json!({"values": [{"id": 100, "content": {"raw": "seen"}}]}));
    write(root, &format!("{base}/issues/1/changes/100.json"), &json!({"changes": {"state": {"new": "resolved"}}}));

    write(
        root,
        &format!("{base}/pullrequests/2.json"),
        &json!({
            "id": 2,
            "destination": {"commit": {"links": {"self": {"href": format!("{base}/commit/aaa.json")}}}},
            "merge_commit": {"links": {"self": {"href": format!("{base}/commit/bbb.json")}}}
        }),
    );
    write(root, &format!("{base}/pullrequests/2/comments_page=1.json"), &json!({"values": []}));
    write(root, &format!("{base}/commit/aaa.json"), &json!({"hash": "aaa", "git_hash": "1111"}));
    write(root, &format!("{base}/commit/bbb.json"), &json!({"hash": "bbb", "git_hash": "2222"}));
    write(root, &format!("{base}/commit/bbb/comments_page=1.json"), &json!({"values": [{"id": 7}]}));

    dir
}

fn router_over(dir: &TempDir) -> (Router, Arc<BootstrapGate>) {
    let gate = Arc::new(BootstrapGate::new(Arc::new(FsSource::new(dir.path())), "repos.json"));
    let router = Router::from_config(&ViewerConfig::default(), gate.clone()).unwrap();
    (router, gate)
}

async fn load(gate: &BootstrapGate, transition: &Transition) -> ViewModel {
    let state = transition.view_state().expect("navigation should activate a view");
    let registry = gate.ready().await.unwrap();
    ViewLoader::new(gate.source().clone(), registry).load(state).await.unwrap()
}

#[derive(Clone, Default)]
struct History(Arc<Mutex<Vec<String>>>);

impl RouteObserver for History {
    fn on_transition(&self, transition: &Transition) {
        let entry = match transition {
            Transition::Activated(state) => format!("activated {}", state.view),
            Transition::Retained(state) => format!("retained {}", state.view),
            Transition::External(url) => format!("external {url}"),
            Transition::Failed(err) => format!("failed {}", err.kind()),
        };
        self.0.lock().unwrap().push(entry);
    }
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_issue_flow() {
    let dir = export();
    let (mut router, gate) = router_over(&dir);

    let list = router.navigate("#!/owner/alpha/issues").await;
    let ViewModel::IssuesList { issues, .. } = load(&gate, &list).await else {
        panic!("expected the issues list");
    };
    assert_eq!(issues.values.len(), 1);

    let transition = router.navigate("#!/owner/alpha/issue/1/crash").await;
    let ViewModel::IssueDetails(details) = load(&gate, &transition).await else {
        panic!("expected issue details");
    };
    assert_eq!(details.issue["title"], "Crash");
    assert_eq!(details.comments.values[0]["changes"]["changes"]["state"]["new"], "resolved");
    assert!(details.attachments.is_empty());
}

#[tokio::test]
async fn test_search_change_keeps_details_view() {
    let dir = export();
    let (mut router, _gate) = router_over(&dir);
    let history = History::default();
    router.subscribe(Box::new(history.clone()));

    router.navigate("/owner/alpha/issues/1/page/1").await;
    router.navigate("/owner/alpha/issues/1/page/1#comment-100").await;
    router.navigate("/owner/alpha/issues/page/1?sort=id").await;
    router.navigate("/owner/alpha/issues/page/1?sort=title").await;

    assert_eq!(
        *history.0.lock().unwrap(),
        vec![
            "activated issue-details",
            "retained issue-details",
            "activated issues-list",
            "activated issues-list",
        ]
    );
    assert_eq!(
        router.current().unwrap().location.query.as_deref(),
        Some("sort=title")
    );
}

#[tokio::test]
async fn test_pull_request_links_to_mirror_compare() {
    let dir = export();
    let (mut router, gate) = router_over(&dir);

    let transition = router.navigate("/owner/alpha/pull-requests/2").await;
    let ViewModel::PullRequestDetails(details) = load(&gate, &transition).await else {
        panic!("expected pull request details");
    };

    assert_eq!(details.diff_url.as_deref(), Some("https://github.com/owner/alpha/compare/1111..2222"));
}

#[tokio::test]
async fn test_commit_view_and_source_link() {
    let dir = export();
    let (mut router, gate) = router_over(&dir);

    let commit = router.navigate("/owner/alpha/commits/bbb").await;
    let ViewModel::CommitDetails(details) = load(&gate, &commit).await else {
        panic!("expected commit details");
    };
    assert_eq!(details.comments.values.len(), 1);

    let source = router.navigate("/owner/alpha/src/bbb/lib/mod.rs#cl-42").await;
    assert_eq!(
        source,
        Transition::External("https://github.com/owner/alpha/blob/2222/lib/mod.rs#L42".into())
    );
    assert_eq!(router.current().unwrap().pattern, "/:owner/:project/commits/:commitSlug/page/:pageId");
}

#[tokio::test]
async fn test_unknown_revision_fails_visibly() {
    let dir = export();
    let (mut router, _gate) = router_over(&dir);

    let transition = router.navigate("/owner/alpha/src/ffff/README").await;

    assert!(matches!(transition, Transition::Failed(ref err) if err.kind() == "route-resolution-failure"));
}

#[tokio::test]
async fn test_repo_list_and_index_page() {
    let dir = export();
    let (mut router, gate) = router_over(&dir);

    let root = router.navigate("/").await;
    let ViewModel::RepoList { projects } = load(&gate, &root).await else {
        panic!("expected the project list");
    };
    assert_eq!(projects[0].description.as_deref(), Some("An archived project"));

    let index = router.navigate("/owner/alpha/").await;
    let ViewModel::IndexPage { links, .. } = load(&gate, &index).await else {
        panic!("expected the project index");
    };
    assert_eq!(links.len(), 4);
}
