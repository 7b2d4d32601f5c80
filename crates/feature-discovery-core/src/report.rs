//! Discovery report: a pure projection over the discovered features.

use std::collections::BTreeMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::feature::DiscoveredFeature;
use crate::test_case::{TestCase, TestResult};

/// Derived feature counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Top-level feature count per type name
    pub by_type: BTreeMap<String, usize>,
    /// Features with at least one supported action
    pub interactive: usize,
    /// Features with non-empty text
    pub with_text: usize,
    /// Features with a captured attribute map
    pub with_attributes: usize,
}

impl Statistics {
    /// Compute statistics over top-level features.
    pub fn from_features(features: &[Arc<DiscoveredFeature>]) -> Self {
        let mut stats = Statistics::default();
        for feature in features {
            *stats
                .by_type
                .entry(feature.feature_type.as_str().to_string())
                .or_insert(0) += 1;
            if feature.is_interactive() {
                stats.interactive += 1;
            }
            if feature.has_text() {
                stats.with_text += 1;
            }
            if feature.attributes.is_some() {
                stats.with_attributes += 1;
            }
        }
        stats
    }

    /// Sum of the per-type counts.
    pub fn total(&self) -> usize {
        self.by_type.values().sum()
    }
}

/// Page-level structural element counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageMetrics {
    /// `form` elements
    pub forms: usize,
    /// `a[href]` elements
    pub links: usize,
    /// `img` elements
    pub images: usize,
    /// `h1`..`h6` elements
    pub headings: usize,
    /// `table` elements
    pub tables: usize,
    /// `ul`/`ol` elements
    pub lists: usize,
    /// `iframe` elements
    pub iframes: usize,
    /// `button` elements
    pub buttons: usize,
    /// `input`, `textarea` and `select` elements
    pub inputs: usize,
}

/// How one discovery category fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryResult {
    /// Category ran; `count` features were kept
    Discovered {
        /// Features contributed
        count: usize,
    },
    /// Category contributed nothing because it failed
    Empty {
        /// Failure description
        reason: String,
    },
}

/// Result of running one discovery category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryOutcome {
    /// Category (service) name
    pub category: String,
    /// What happened
    #[serde(flatten)]
    pub result: CategoryResult,
}

impl CategoryOutcome {
    /// Successful category.
    pub fn discovered(category: impl Into<String>, count: usize) -> Self {
        Self {
            category: category.into(),
            result: CategoryResult::Discovered { count },
        }
    }

    /// Failed category.
    pub fn empty(category: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            result: CategoryResult::Empty {
                reason: reason.into(),
            },
        }
    }

    /// Whether the category failed.
    pub fn is_failure(&self) -> bool {
        matches!(self.result, CategoryResult::Empty { .. })
    }
}

/// Outcome of one discovery run.
///
/// `features_discovered` and `statistics` are always derived from `features`;
/// there is no way to set them independently.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    timestamp: String,
    url: String,
    features_discovered: usize,
    features: Vec<Arc<DiscoveredFeature>>,
    test_cases: Vec<TestCase>,
    statistics: Statistics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    test_results: Vec<TestResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_metrics: Option<PageMetrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    categories: Vec<CategoryOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    screenshot: Option<String>,
}

impl DiscoveryReport {
    /// Assemble a report stamped with the current time.
    pub fn assemble(
        url: impl Into<String>,
        features: Vec<Arc<DiscoveredFeature>>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        Self::assemble_at(chrono::Utc::now().to_rfc3339(), url, features, test_cases)
    }

    /// Assemble a report with an explicit ISO-8601 timestamp.
    pub fn assemble_at(
        timestamp: impl Into<String>,
        url: impl Into<String>,
        features: Vec<Arc<DiscoveredFeature>>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        let statistics = Statistics::from_features(&features);
        Self {
            timestamp: timestamp.into(),
            url: url.into(),
            features_discovered: features.len(),
            features,
            test_cases,
            statistics,
            test_results: Vec::new(),
            page_metrics: None,
            categories: Vec::new(),
            backend: None,
            title: None,
            screenshot: None,
        }
    }

    /// Parse a persisted report, recomputing the derived counts.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let parsed: DiscoveryReport = serde_json::from_str(json)?;
        let mut report =
            Self::assemble_at(parsed.timestamp, parsed.url, parsed.features, parsed.test_cases);
        report.test_results = parsed.test_results;
        report.page_metrics = parsed.page_metrics;
        report.categories = parsed.categories;
        report.backend = parsed.backend;
        report.title = parsed.title;
        report.screenshot = parsed.screenshot;
        Ok(report)
    }

    /// Attach execution results.
    pub fn with_test_results(mut self, results: Vec<TestResult>) -> Self {
        self.test_results = results;
        self
    }

    /// Attach page metrics.
    pub fn with_page_metrics(mut self, metrics: Option<PageMetrics>) -> Self {
        self.page_metrics = metrics;
        self
    }

    /// Attach per-category outcomes.
    pub fn with_categories(mut self, categories: Vec<CategoryOutcome>) -> Self {
        self.categories = categories;
        self
    }

    /// Attach the backend name.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Attach the page title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Attach a base64 page screenshot.
    pub fn with_screenshot(mut self, screenshot: Option<String>) -> Self {
        self.screenshot = screenshot;
        self
    }

    /// Report timestamp (ISO 8601).
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Page URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of top-level features.
    pub fn features_discovered(&self) -> usize {
        self.features_discovered
    }

    /// Discovered features, in discovery order.
    pub fn features(&self) -> &[Arc<DiscoveredFeature>] {
        &self.features
    }

    /// Synthesized test cases.
    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    /// Derived statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Execution results, if tests were run.
    pub fn test_results(&self) -> &[TestResult] {
        &self.test_results
    }

    /// Page metrics, if collected.
    pub fn page_metrics(&self) -> Option<&PageMetrics> {
        self.page_metrics.as_ref()
    }

    /// Per-category outcomes.
    pub fn categories(&self) -> &[CategoryOutcome] {
        &self.categories
    }

    /// Backend that produced the report.
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    /// Page title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Base64 page screenshot.
    pub fn screenshot(&self) -> Option<&str> {
        self.screenshot.as_deref()
    }

    /// Number of failed test results.
    pub fn failed_tests(&self) -> usize {
        self.test_results.iter().filter(|r| !r.success).count()
    }
}
