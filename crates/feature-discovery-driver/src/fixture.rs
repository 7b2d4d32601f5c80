//! Site fixtures for the static backend.
//!
//! A fixture describes a handful of pages as element trees. It can be built in
//! code or loaded from YAML (JSON is accepted too, being a YAML subset).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use feature_discovery_core::Result;

/// Set of pages keyed by URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticSite {
    /// Pages by absolute URL
    #[serde(default)]
    pub pages: BTreeMap<String, PageFixture>,
}

impl StaticSite {
    /// Create an empty site.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page.
    pub fn page(mut self, url: impl Into<String>, page: PageFixture) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Load a site from a YAML or JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a site from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Find the page for `url`, tolerating a trailing slash difference.
    pub fn lookup(&self, url: &str) -> Option<(&str, &PageFixture)> {
        let trimmed = url.trim_end_matches('/');
        self.pages
            .iter()
            .find(|(key, _)| key.as_str() == url || key.trim_end_matches('/') == trimmed)
            .map(|(key, page)| (key.as_str(), page))
    }
}

/// One page: a title and the children of `<body>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFixture {
    /// Document title
    #[serde(default)]
    pub title: String,
    /// Top-level body content
    #[serde(default)]
    pub body: Vec<NodeFixture>,
}

impl PageFixture {
    /// Create a page with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Vec::new(),
        }
    }

    /// Append a top-level node.
    pub fn node(mut self, node: NodeFixture) -> Self {
        self.body.push(node);
        self
    }
}

/// One element of a page fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFixture {
    /// Tag name
    pub tag: String,
    /// Attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Own text, rendered before the children
    #[serde(default)]
    pub text: Option<String>,
    /// Not rendered (as if styled `display: none`)
    #[serde(default)]
    pub hidden: bool,
    /// Child elements
    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

impl NodeFixture {
    /// Create an element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set own text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Mark as not rendered.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Append a child.
    pub fn child(mut self, child: NodeFixture) -> Self {
        self.children.push(child);
        self
    }
}
