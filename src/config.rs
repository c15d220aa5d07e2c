// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest first: built-in defaults, a TOML file, then
//! `ARCHIVE_ROUTER_*` environment variables.

use crate::bootstrap::DEFAULT_INDEX_FILE;
use crate::links::DEFAULT_BRANCH;
use crate::pagination::DEFAULT_MAX_PAGES;
use crate::params::DEFAULT_PAGE_PARAMS;
use crate::revision::LATEST_ALIASES;
use crate::router::DEFAULT_MAX_REDIRECTS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "ARCHIVE_ROUTER";

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Export directory or `http(s)://` URL of the published site
    pub data_root: String,
    /// Project index path relative to `data_root`
    pub index_file: String,
    /// Mirrored branch used for "latest" source links
    pub default_branch: String,
    /// Revision references meaning "latest"
    pub latest_aliases: Vec<String>,
    /// Route parameters coerced to page numbers
    pub page_params: Vec<String>,
    /// Limit on chained static redirects
    pub max_redirects: usize,
    /// Limit on pages fetched from one chain
    pub max_pages: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_root: ".".to_string(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            latest_aliases: LATEST_ALIASES.iter().map(|a| (*a).to_string()).collect(),
            page_params: DEFAULT_PAGE_PARAMS.iter().map(|p| (*p).to_string()).collect(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_pages: DEFAULT_MAX_PAGES,
            log_level: "info".to_string(),
        }
    }
}

/// Per-user configuration file, if the platform has a config directory
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "archive-router")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist; the per-user file is optional.
pub fn load(path: Option<&Path>) -> Result<ViewerConfig> {
    let defaults = config::Config::try_from(&ViewerConfig::default())
        .context("Failed to build default configuration")?;

    let mut builder = config::Config::builder().add_source(defaults);
    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("latest_aliases")
                .with_list_parse_key("page_params"),
        )
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.index_file, "repos.json");
        assert_eq!(config.default_branch, "master");
        assert_eq!(config.latest_aliases, vec!["tip", "default"]);
        assert_eq!(config.page_params, vec!["pageId", "page"]);
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "default_branch = \"main\"\nmax_redirects = 3\n").unwrap();

        let config = load(Some(&path)).unwrap();

        assert_eq!(config.default_branch, "main");
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.index_file, "repos.json");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_partial_toml_deserializes_with_defaults() {
        let config: ViewerConfig = toml::from_str("data_root = \"site\"").unwrap();
        assert_eq!(config.data_root, "site");
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }
}
