// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Read-only access to the exported JSON documents
//!
//! An archive is a tree of static JSON files. It can be read straight from an
//! export directory on disk, from the published static site over HTTP, or from
//! memory in tests.

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;
use url::Url;

/// A read-only store of JSON documents addressed by archive-relative path
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch and parse one JSON document
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError>;

    /// Human-readable location of the archive
    fn describe(&self) -> String;
}

/// Fetch a document and decode it into `T`
pub async fn fetch_as<T: DeserializeOwned>(
    source: &dyn DataSource,
    path: &str,
) -> Result<T, FetchError> {
    let value = source.fetch_json(path).await?;
    serde_json::from_value(value).map_err(|e| FetchError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Open the archive at `root`: an `http(s)://` URL or a directory
pub fn open(root: &str) -> Result<Arc<dyn DataSource>, FetchError> {
    if root.starts_with("http://") || root.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(root)?))
    } else {
        Ok(Arc::new(FsSource::new(root)))
    }
}

// =============================================================================
// Filesystem
// =============================================================================

/// Reads documents from an export directory on disk
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at the export's site directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an archive path onto a file below the root
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        if path.contains("://") {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError> {
        let file = self.resolve(path)?;
        debug!("Reading {}", file.display());

        let bytes = tokio::fs::read(&file).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(path.to_string())
            } else {
                FetchError::Transport {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Reads documents from a published static site
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    /// Create a source for the site at `base_url`
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a source with a custom reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, FetchError> {
        // Url::join drops the last segment unless the base ends in '/'
        let mut normalized = base_url.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|e| FetchError::InvalidPath(format!("{base_url}: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn document_url(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidPath(format!("{path}: {e}")))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.document_url(path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(path.to_string())),
            status if !status.is_success() => Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            }),
            _ => response.json::<Value>().await.map_err(|e| FetchError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

// =============================================================================
// Memory
// =============================================================================

/// An in-memory archive, intended primarily for testing.
///
/// Records every requested path so callers can assert which documents were
/// (or were not) fetched.
#[derive(Default)]
pub struct MemorySource {
    documents: RwLock<HashMap<String, Result<Value, FetchError>>>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    /// Create an empty archive
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str) -> String {
        path.trim_start_matches('/').to_string()
    }

    /// Store a document at `path`
    pub fn insert(&self, path: &str, value: Value) {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents.insert(Self::key(path), Ok(value));
    }

    /// Make every fetch of `path` fail with `error`
    pub fn fail(&self, path: &str, error: FetchError) {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents.insert(Self::key(path), Err(error));
    }

    /// Paths requested so far, in request order
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of fetches performed so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError> {
        let key = Self::key(path);
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(key.clone());

        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        match documents.get(&key) {
            Some(result) => result.clone(),
            None => Err(FetchError::NotFound(path.to_string())),
        }
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
