//! Configuration types for feature discovery runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::Error;

/// Run configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Driver settings
    pub driver: DriverSettings,
    /// Discovery settings
    pub discovery: DiscoverySettings,
    /// Synthesis and execution settings
    pub execution: ExecutionSettings,
    /// Output settings
    pub output: OutputSettings,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            driver: DriverSettings::default(),
            discovery: DiscoverySettings::default(),
            execution: ExecutionSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// An unknown `discovery.mode` is a configuration error, not a parse error.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if let Some(mode) = value.get("discovery").and_then(|d| d.get("mode")) {
            let mode = mode
                .as_str()
                .ok_or_else(|| Error::Config("discovery.mode must be a string".to_string()))?;
            mode.parse::<DiscoveryMode>()?;
        }
        let config: DiscoveryConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.driver.backend.trim().is_empty() {
            return Err(Error::Config("driver.backend cannot be empty".to_string()));
        }

        if self.driver.timeout_ms == 0 {
            return Err(Error::Config("driver.timeout_ms must be > 0".to_string()));
        }

        if self.driver.navigation_timeout_ms == 0 {
            return Err(Error::Config(
                "driver.navigation_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.discovery.max_elements_per_category == 0 {
            return Err(Error::Config(
                "discovery.max_elements_per_category must be > 0".to_string(),
            ));
        }

        if self
            .discovery
            .test_id_attributes
            .iter()
            .all(|a| a.trim().is_empty())
        {
            return Err(Error::Config(
                "discovery.test_id_attributes must name at least one attribute".to_string(),
            ));
        }

        if self.execution.execute_tests && !self.execution.generate_tests {
            return Err(Error::Config(
                "execution.execute_tests requires execution.generate_tests".to_string(),
            ));
        }

        Ok(())
    }
}

/// Driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Backend name (static, cdp, webdriver)
    pub backend: String,
    /// Per-operation timeout during test execution, in milliseconds
    pub timeout_ms: u64,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// Time to wait after navigation before discovery, in milliseconds
    pub settle_ms: u64,
    /// Site fixture for the static backend
    pub fixture_path: Option<PathBuf>,
    /// WebDriver endpoint
    pub webdriver_url: String,
    /// Run the browser headless (cdp backend)
    pub headless: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            backend: "static".to_string(),
            timeout_ms: 3000,
            navigation_timeout_ms: 30_000,
            settle_ms: 0,
            fixture_path: None,
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
        }
    }
}

/// Which discovery services run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Specialized per-category services
    #[default]
    Standard,
    /// Count-then-index scanning only
    Generic,
}

impl FromStr for DiscoveryMode {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "standard" => Ok(DiscoveryMode::Standard),
            "generic" => Ok(DiscoveryMode::Generic),
            other => Err(Error::Config(format!(
                "discovery.mode must be 'standard' or 'generic', got '{other}'"
            ))),
        }
    }
}

/// Discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Service selection
    pub mode: DiscoveryMode,
    /// Report disabled buttons too
    pub include_disabled: bool,
    /// Upper bound on elements inspected per category
    pub max_elements_per_category: usize,
    /// Stable test-identifier attributes, in preference order
    pub test_id_attributes: Vec<String>,
    /// Capture a screenshot per discovered feature
    pub capture_feature_screenshots: bool,
    /// Shorten generated selectors against the live page
    pub optimize_selectors: bool,
    /// Collect page-level structural counts
    pub collect_page_metrics: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::Standard,
            include_disabled: false,
            max_elements_per_category: 200,
            test_id_attributes: default_test_id_attributes(),
            capture_feature_screenshots: false,
            optimize_selectors: true,
            collect_page_metrics: true,
        }
    }
}

/// Default stable test-identifier attributes.
pub fn default_test_id_attributes() -> Vec<String> {
    ["data-testid", "data-test-id", "data-test", "data-cy", "data-qa"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Synthesis and execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Synthesize test cases from discovered features
    pub generate_tests: bool,
    /// Run the synthesized test cases
    pub execute_tests: bool,
    /// Click every link of a navigation container instead of one
    pub follow_navigation_links: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            generate_tests: true,
            execute_tests: true,
            follow_navigation_links: false,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving report files
    pub directory: PathBuf,
    /// Capture a page screenshot into the report
    pub capture_screenshot: bool,
    /// Pretty-print the JSON report
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./feature-reports"),
            capture_screenshot: false,
            pretty: true,
        }
    }
}
