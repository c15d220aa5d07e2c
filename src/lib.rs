// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! archive-router library - navigation core for static repository archives
//!
//! This crate maps viewer URLs onto view states for an exported project
//! archive (issues, pull requests, commits) and translates archived source
//! links into links on the live mirrored repository.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod links;
pub mod pagination;
pub mod params;
pub mod revision;
pub mod route;
pub mod router;
pub mod source;
pub mod views;

/// Core data types of an exported archive
pub mod types {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::collections::BTreeMap;

    // =========================================================================
    // Project Index
    // =========================================================================

    /// One entry of the project index (`repos.json`)
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProjectIndexEntry {
        /// Directory holding the project's exported data
        pub project_path: String,
        /// Metadata document; derived from `project_path` when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub project_file: Option<String>,
        /// URL of the mirrored live repository
        #[serde(default, alias = "mirror_url", skip_serializing_if = "Option::is_none")]
        pub github_repo: Option<String>,
    }

    impl ProjectIndexEntry {
        /// Path of the project's metadata document
        #[must_use]
        pub fn metadata_path(&self) -> String {
            match &self.project_file {
                Some(file) => file.clone(),
                None => format!("{}.json", self.project_path.trim_end_matches('/')),
            }
        }
    }

    /// The project index, keyed by `owner/name` slug
    pub type ProjectIndex = BTreeMap<String, ProjectIndexEntry>;

    // =========================================================================
    // Project
    // =========================================================================

    /// An archived project, loaded once at bootstrap
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Project {
        /// `owner/name` slug
        pub slug: String,
        /// Base data path, always ending in `/`
        pub project_path: String,
        /// Mirrored live repository, if the project was migrated
        pub mirror_url: Option<String>,
        /// Opaque project metadata
        pub metadata: Value,
    }

    impl Project {
        /// Build a project from its index entry and fetched metadata
        #[must_use]
        pub fn from_index(slug: String, entry: ProjectIndexEntry, metadata: Value) -> Self {
            let mut project_path = entry.project_path;
            if !project_path.ends_with('/') {
                project_path.push('/');
            }
            Self {
                slug,
                project_path,
                mirror_url: entry.github_repo.filter(|url| !url.trim().is_empty()),
                metadata,
            }
        }

        /// Path of a document inside this project's data directory
        #[must_use]
        pub fn data_path(&self, relative: &str) -> String {
            format!("{}{}", self.project_path, relative.trim_start_matches('/'))
        }

        /// Display name from metadata, falling back to the slug's name part
        #[must_use]
        pub fn name(&self) -> &str {
            self.metadata
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_else(|| self.slug.rsplit('/').next().unwrap_or(&self.slug))
        }

        /// Description from metadata
        #[must_use]
        pub fn description(&self) -> Option<&str> {
            self.metadata
                .get("description")
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
        }
    }

    // =========================================================================
    // Paginated Resource
    // =========================================================================

    /// One page of a paginated collection
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Page<T> {
        /// Items on this page, in source order
        #[serde(default = "Vec::new")]
        pub values: Vec<T>,
        /// Link to the following page; absent on the last page
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub next: Option<String>,
        /// Page number as exported
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub page: Option<u64>,
        /// Page length as exported
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub pagelen: Option<u64>,
        /// Total item count across all pages
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub size: Option<u64>,
    }

    impl<T> Default for Page<T> {
        fn default() -> Self {
            Self {
                values: Vec::new(),
                next: None,
                page: None,
                pagelen: None,
                size: None,
            }
        }
    }

    impl<T> Page<T> {
        /// Link to the following page, ignoring empty strings
        #[must_use]
        pub fn next_link(&self) -> Option<&str> {
            self.next.as_deref().filter(|n| !n.is_empty())
        }
    }

    // =========================================================================
    // Cross-Host Commit Record
    // =========================================================================

    /// Commit lookup document (`<project>/commit/<hash>.json`)
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CommitRecord {
        /// Archive-native (Mercurial) node id
        #[serde(default)]
        pub hash: Option<String>,
        /// Corresponding git hash on the mirrored host
        #[serde(default)]
        pub git_hash: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::types::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Comment {
        id: u64,
    }

    #[test]
    fn test_page_without_values_decodes_items_lacking_default() {
        let page: Page<Comment> = serde_json::from_str(r#"{"page": 3}"#).unwrap();
        assert!(page.values.is_empty());
        assert_eq!(page.page, Some(3));

        let page: Page<Comment> = serde_json::from_str(r#"{"values": [{"id": 7}], "next": ""}"#).unwrap();
        assert_eq!(page.values, vec![Comment { id: 7 }]);
        assert_eq!(page.next_link(), None);
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{FetchError, Result, ViewerError};
    pub use crate::types::*;
}
