// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Route parameters and the hooks that coerce them before activation

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter names treated as page numbers by default
pub const DEFAULT_PAGE_PARAMS: [&str; 2] = ["pageId", "page"];

/// A page number as a view sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    /// Parsed integer; no bounds are implied
    Number(i64),
    /// The segment was not an integer
    NotANumber,
}

impl PageNumber {
    /// Coerce a path segment. Never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.trim().parse().map_or(Self::NotANumber, Self::Number)
    }

    /// The integer value, if there is one
    #[must_use]
    pub fn get(self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(n),
            Self::NotANumber => None,
        }
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::NotANumber => f.write_str("NaN"),
        }
    }
}

impl Serialize for PageNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::NotANumber => serializer.serialize_none(),
        }
    }
}

/// A captured path parameter after coercion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Plain text segment
    Text(String),
    /// Page number
    Page(PageNumber),
}

/// Named parameters of an activated route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, ParamValue>);

impl RouteParams {
    /// Wrap raw captures as text values
    #[must_use]
    pub fn from_captured(captured: BTreeMap<String, String>) -> Self {
        Self(
            captured
                .into_iter()
                .map(|(name, value)| (name, ParamValue::Text(value)))
                .collect(),
        )
    }

    /// Raw access to one parameter
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// A text parameter
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// A coerced page-number parameter
    #[must_use]
    pub fn page(&self, name: &str) -> Option<PageNumber> {
        match self.0.get(name) {
            Some(ParamValue::Page(page)) => Some(*page),
            _ => None,
        }
    }

    /// Set a parameter
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    /// `owner/project` slug, when both are captured
    #[must_use]
    pub fn project_slug(&self) -> Option<String> {
        Some(format!("{}/{}", self.text("owner")?, self.text("project")?))
    }

    /// Iterate parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Adjusts parameters after matching and before any observer sees them
pub trait ParamHook: Send + Sync {
    /// Rewrite `params` in place
    fn apply(&self, params: &mut RouteParams);
}

/// Turns page-number parameters from text into [`PageNumber`]s
#[derive(Debug, Clone)]
pub struct PageNumberNormalizer {
    names: Vec<String>,
}

impl PageNumberNormalizer {
    /// Normalize the given parameter names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for PageNumberNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_PARAMS)
    }
}

impl ParamHook for PageNumberNormalizer {
    fn apply(&self, params: &mut RouteParams) {
        for name in &self.names {
            if let Some(ParamValue::Text(text)) = params.get(name) {
                let page = PageNumber::parse(text);
                params.insert(name.clone(), ParamValue::Page(page));
            }
        }
    }
}
