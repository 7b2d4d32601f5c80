//! One discovery-to-report run against a connected driver.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use feature_discovery_core::{DiscoveryConfig, DiscoveryReport, ExecutionSettings, Result};
use feature_discovery_detector::DiscoveryService;
use feature_discovery_driver::{with_timeout, Driver, NavigateOptions, ScreenshotOptions};
use feature_discovery_runner::{
    ClickEachLink, ExecutorConfig, InputKindValues, TestCaseSynthesizer, TestExecutor,
};
use tracing::{info, warn};

/// Sequences navigation, discovery, synthesis, execution and report assembly.
///
/// The coordinator holds no driver; one is passed to every [`execute`] call.
///
/// [`execute`]: FeatureDiscoveryCoordinator::execute
pub struct FeatureDiscoveryCoordinator {
    discovery: DiscoveryService,
    synthesizer: TestCaseSynthesizer,
    executor: ExecutorConfig,
    execution: ExecutionSettings,
    capture_screenshot: bool,
}

impl FeatureDiscoveryCoordinator {
    /// Wire discovery, synthesis and execution from `config`.
    pub fn new(config: &DiscoveryConfig) -> Self {
        let mut synthesizer =
            TestCaseSynthesizer::new().with_value_source(Arc::new(InputKindValues));
        if config.execution.follow_navigation_links {
            synthesizer = synthesizer.with_navigation_handler(Arc::new(ClickEachLink));
        }
        Self {
            discovery: DiscoveryService::new(config.discovery.clone()),
            synthesizer,
            executor: ExecutorConfig {
                step_timeout: Duration::from_millis(config.driver.timeout_ms),
                start_url: None,
                navigation_timeout: Duration::from_millis(config.driver.navigation_timeout_ms),
                settle_ms: config.driver.settle_ms,
            },
            execution: config.execution.clone(),
            capture_screenshot: config.output.capture_screenshot,
        }
    }

    /// Replace the discovery service.
    pub fn with_discovery(mut self, discovery: DiscoveryService) -> Self {
        self.discovery = discovery;
        self
    }

    /// Replace the synthesizer.
    pub fn with_synthesizer(mut self, synthesizer: TestCaseSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Navigate `driver` to `url` and produce a report.
    ///
    /// Only a failed navigation to `url` is an error. Failing categories,
    /// failing test cases and a failed screenshot are recorded or skipped.
    pub async fn execute(&self, driver: &dyn Driver, url: &str) -> Result<DiscoveryReport> {
        let navigation_timeout = self.executor.navigation_timeout;
        info!("Navigating to {} ({} backend)", url, driver.backend());
        with_timeout(
            navigation_timeout,
            "navigate",
            driver.navigate(url, NavigateOptions::with_timeout(navigation_timeout)),
        )
        .await?;
        if self.executor.settle_ms > 0 {
            driver.wait_for_timeout(self.executor.settle_ms).await?;
        }

        let title = match driver.title().await {
            Ok(title) => Some(title).filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("page title unavailable: {}", e);
                None
            }
        };

        let outcome = self.discovery.discover(driver).await;
        info!(
            "Discovered {} features across {} categories",
            outcome.features.len(),
            outcome.categories.len()
        );

        let screenshot = if self.capture_screenshot {
            match driver.screenshot(ScreenshotOptions::default()).await {
                Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
                Err(e) => {
                    warn!("page screenshot failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let test_cases = if self.execution.generate_tests {
            self.synthesizer.generate_test_cases(&outcome.features)
        } else {
            Vec::new()
        };

        let test_results = if self.execution.execute_tests && !test_cases.is_empty() {
            let executor = TestExecutor::new(self.executor.clone()).with_start_url(url);
            executor.execute_batch(&test_cases, driver).await
        } else {
            Vec::new()
        };

        Ok(DiscoveryReport::assemble(url, outcome.features, test_cases)
            .with_test_results(test_results)
            .with_page_metrics(outcome.page_metrics)
            .with_categories(outcome.categories)
            .with_backend(driver.backend())
            .with_title(title)
            .with_screenshot(screenshot))
    }
}
