// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types surfaced to the view layer

use thiserror::Error;

/// Result alias for router operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Failure to fetch one static JSON document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The document does not exist in the archive
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The path cannot address a document in this archive
    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    /// The server answered with a non-success status
    #[error("unexpected status {status} for {path}")]
    Status {
        /// Requested path
        path: String,
        /// HTTP status code
        status: u16,
    },

    /// I/O or network failure
    #[error("transport error for {path}: {message}")]
    Transport {
        /// Requested path
        path: String,
        /// Underlying error text
        message: String,
    },

    /// The document is not the JSON shape we expected
    #[error("failed to decode {path}: {message}")]
    Decode {
        /// Requested path
        path: String,
        /// Decoder message
        message: String,
    },
}

impl FetchError {
    /// Whether this is a plain "document missing" failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors the navigation core reports to the view layer.
///
/// Every variant is `Clone` so a memoised bootstrap failure can be handed to
/// each navigation that waits on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// The project index or a project's metadata could not be loaded
    #[error("bootstrap failed loading {resource}: {source}")]
    BootstrapFailure {
        /// Index path or `slug (path)` of the failing document
        resource: String,
        /// Underlying fetch failure
        source: FetchError,
    },

    /// A `next` link did not advance
    #[error("pagination anomaly at {url}: {reason}")]
    PaginationAnomaly {
        /// Offending link
        url: String,
        /// What went wrong
        reason: String,
    },

    /// A redirect or its prerequisite lookup failed
    #[error("route resolution failed: {0}")]
    RouteResolutionFailure(String),

    /// The archive or router is misconfigured
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A view's required resource could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ViewerError {
    /// Short kind label for display and logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BootstrapFailure { .. } => "bootstrap-failure",
            Self::PaginationAnomaly { .. } => "pagination-anomaly",
            Self::RouteResolutionFailure(_) => "route-resolution-failure",
            Self::ConfigurationError(_) => "configuration-error",
            Self::Fetch(_) => "fetch-error",
        }
    }
}
