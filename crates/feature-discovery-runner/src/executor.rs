//! Test case execution against a live driver.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use feature_discovery_core::{
    Assertion, AssertionType, DriverError, Expected, StepAction, TestCase, TestResult, TestStep,
};
use feature_discovery_driver::{
    with_timeout, ClickOptions, Driver, ElementHandle, NavigateOptions, ScreenshotOptions,
};
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default budget for a single step or assertion.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(3);

/// Why a test case stopped.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Loading the start page failed
    #[error("navigation failed: {0}")]
    Navigation(#[source] DriverError),

    /// The feature's selector matched nothing
    #[error("feature selector '{0}' matched no element")]
    FeatureMissing(String),

    /// The feature's selector could not be resolved
    #[error("could not resolve feature selector '{selector}': {source}")]
    Resolve {
        /// Feature selector
        selector: String,
        /// Driver failure
        #[source]
        source: DriverError,
    },

    /// A step's driver call failed
    #[error("step {index} ({action}) on '{selector}' failed: {source}")]
    Step {
        /// Zero-based step index
        index: usize,
        /// Step action name
        action: &'static str,
        /// Target selector
        selector: String,
        /// Driver failure
        #[source]
        source: DriverError,
    },

    /// A step needs a value and has none
    #[error("step {index} ({action}) requires a value")]
    MissingValue {
        /// Zero-based step index
        index: usize,
        /// Step action name
        action: &'static str,
    },

    /// An assertion evaluated to false
    #[error("assertion {index} ({kind}) on '{selector}' failed: {reason}")]
    Assertion {
        /// Zero-based assertion index
        index: usize,
        /// Assertion type name
        kind: &'static str,
        /// Target selector
        selector: String,
        /// What was observed
        reason: String,
    },

    /// An assertion's driver call failed
    #[error("assertion {index} ({kind}) on '{selector}' could not be evaluated: {source}")]
    Evaluate {
        /// Zero-based assertion index
        index: usize,
        /// Assertion type name
        kind: &'static str,
        /// Target selector
        selector: String,
        /// Driver failure
        #[source]
        source: DriverError,
    },

    /// The driver panicked mid-case
    #[error("driver panicked: {0}")]
    Panicked(String),
}

/// Executor settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Budget for each step and assertion
    pub step_timeout: Duration,
    /// Page loaded before every case, so cases start from the same state
    pub start_url: Option<String>,
    /// Budget for loading `start_url`
    pub navigation_timeout: Duration,
    /// Pause after loading `start_url`
    pub settle_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            start_url: None,
            navigation_timeout: Duration::from_secs(30),
            settle_ms: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    steps: usize,
    assertions: usize,
}

/// Runs test cases and reports one [`TestResult`] per case.
///
/// Execution never fails: driver errors, timeouts, failed assertions and
/// driver panics all become unsuccessful results.
#[derive(Debug, Clone, Default)]
pub struct TestExecutor {
    config: ExecutorConfig,
}

impl TestExecutor {
    /// Create an executor with `config`.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Load `url` before every case.
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.config.start_url = Some(url.into());
        self
    }

    /// Per-step budget.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.config.step_timeout = timeout;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute one case: resolve the feature, run the steps, then evaluate
    /// the assertions. Stops at the first failure.
    pub async fn execute(&self, test_case: &TestCase, driver: &dyn Driver) -> TestResult {
        let start = Instant::now();
        let mut progress = Progress::default();

        let outcome = AssertUnwindSafe(self.run(test_case, driver, &mut progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ExecutionError::Panicked(panic_message(&*panic))));
        let elapsed = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                debug!("{} passed in {}ms", test_case.id, elapsed);
                TestResult::passed(test_case, elapsed)
            }
            Err(e) => {
                warn!("{} failed: {}", test_case.id, e);
                TestResult::failed(
                    test_case,
                    e.to_string(),
                    elapsed,
                    progress.steps,
                    progress.assertions,
                )
            }
        }
    }

    /// Execute `cases` one after another on the same driver. The result list
    /// matches `cases` in length and order.
    pub async fn execute_batch(&self, cases: &[TestCase], driver: &dyn Driver) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.execute(case, driver).await);
        }
        let passed = results.iter().filter(|r| r.success).count();
        info!(
            "executed {} test cases: {} passed, {} failed",
            results.len(),
            passed,
            results.len() - passed
        );
        results
    }

    async fn run(
        &self,
        test_case: &TestCase,
        driver: &dyn Driver,
        progress: &mut Progress,
    ) -> Result<(), ExecutionError> {
        if let Some(url) = &self.config.start_url {
            let budget = self.config.navigation_timeout;
            with_timeout(
                budget,
                "navigate",
                driver.navigate(url, NavigateOptions::with_timeout(budget)),
            )
            .await
            .map_err(ExecutionError::Navigation)?;
            if self.config.settle_ms > 0 {
                driver
                    .wait_for_timeout(self.config.settle_ms)
                    .await
                    .map_err(ExecutionError::Navigation)?;
            }
        }

        let selector = &test_case.feature.selector;
        let matches = self
            .bounded("count", driver.locate(selector).count())
            .await
            .map_err(|source| ExecutionError::Resolve {
                selector: selector.clone(),
                source,
            })?;
        if matches == 0 {
            return Err(ExecutionError::FeatureMissing(selector.clone()));
        }

        for (index, step) in test_case.steps.iter().enumerate() {
            self.perform(index, step, driver).await?;
            progress.steps += 1;
        }
        for (index, assertion) in test_case.assertions.iter().enumerate() {
            self.check(index, assertion, driver).await?;
            progress.assertions += 1;
        }
        Ok(())
    }

    async fn perform(
        &self,
        index: usize,
        step: &TestStep,
        driver: &dyn Driver,
    ) -> Result<(), ExecutionError> {
        let action = step.action.as_str();
        let value = || {
            step.value
                .as_deref()
                .ok_or(ExecutionError::MissingValue { index, action })
        };
        let element = driver.locate(&step.selector).first();
        debug!("step {}: {} {}", index, action, step.selector);

        let result = match step.action {
            StepAction::Click => {
                self.bounded(action, element.click(ClickOptions::default()))
                    .await
            }
            StepAction::Fill => self.bounded(action, element.fill(value()?)).await,
            StepAction::Select => self.bounded(action, element.select_option(value()?)).await,
            StepAction::Press => self.bounded(action, element.press(value()?)).await,
            StepAction::Check => self.bounded(action, element.check()).await,
            StepAction::Uncheck => self.bounded(action, element.uncheck()).await,
            StepAction::Hover => self.bounded(action, element.hover()).await,
            StepAction::Focus => self.bounded(action, element.focus()).await,
            StepAction::Screenshot => {
                let options = ScreenshotOptions {
                    path: step.value.as_ref().map(PathBuf::from),
                };
                self.bounded(action, element.screenshot(options))
                    .await
                    .map(|_| ())
            }
        };
        result.map_err(|source| ExecutionError::Step {
            index,
            action,
            selector: step.selector.clone(),
            source,
        })
    }

    async fn check(
        &self,
        index: usize,
        assertion: &Assertion,
        driver: &dyn Driver,
    ) -> Result<(), ExecutionError> {
        let kind = assertion.assertion_type.as_str();
        let selector = &assertion.selector;
        let evaluate_error = |source: DriverError| ExecutionError::Evaluate {
            index,
            kind,
            selector: selector.clone(),
            source,
        };
        let fail = |reason: String| ExecutionError::Assertion {
            index,
            kind,
            selector: selector.clone(),
            reason,
        };

        let locator = driver.locate(selector);
        let element = locator.first();
        match assertion.assertion_type {
            AssertionType::Visible => {
                if !self.visible(element.as_ref()).await.map_err(evaluate_error)? {
                    return Err(fail("element is not visible".to_string()));
                }
            }
            AssertionType::Hidden => {
                if self.visible(element.as_ref()).await.map_err(evaluate_error)? {
                    return Err(fail("element is visible".to_string()));
                }
            }
            AssertionType::Enabled | AssertionType::Disabled => {
                let enabled = self
                    .bounded(kind, element.is_enabled())
                    .await
                    .map_err(evaluate_error)?;
                let want = assertion.assertion_type == AssertionType::Enabled;
                if enabled != want {
                    let state = if enabled { "enabled" } else { "disabled" };
                    return Err(fail(format!("element is {state}")));
                }
            }
            AssertionType::Text => {
                let text = self
                    .bounded(kind, element.text_content())
                    .await
                    .map_err(evaluate_error)?
                    .unwrap_or_default();
                match &assertion.expected {
                    Some(Expected::Text(want)) if !text.contains(want.as_str()) => {
                        return Err(fail(format!(
                            "text '{}' does not contain '{}'",
                            text.trim(),
                            want
                        )));
                    }
                    None if text.trim().is_empty() => {
                        return Err(fail("element has no text".to_string()));
                    }
                    Some(Expected::Text(_)) | None => {}
                    Some(other) => return Err(fail(format!("unsupported expectation {other:?}"))),
                }
            }
            AssertionType::Count => {
                let count = self
                    .bounded(kind, locator.count())
                    .await
                    .map_err(evaluate_error)?;
                match &assertion.expected {
                    Some(Expected::Count(want)) if count != *want => {
                        return Err(fail(format!("expected {want} matches, found {count}")));
                    }
                    None if count == 0 => return Err(fail("no matches".to_string())),
                    Some(Expected::Count(_)) | None => {}
                    Some(other) => return Err(fail(format!("unsupported expectation {other:?}"))),
                }
            }
            AssertionType::Attribute => {
                let Some(Expected::Attributes(expected)) = &assertion.expected else {
                    return Err(fail("no expected attributes".to_string()));
                };
                for (name, want) in expected {
                    let actual = self
                        .bounded(kind, element.get_attribute(name))
                        .await
                        .map_err(evaluate_error)?;
                    if actual.as_deref() != Some(want.as_str()) {
                        return Err(fail(format!(
                            "attribute '{name}' is {actual:?}, expected '{want}'"
                        )));
                    }
                }
            }
            AssertionType::Class => {
                let Some(Expected::Text(class)) = &assertion.expected else {
                    return Err(fail("no expected class".to_string()));
                };
                let classes = self
                    .bounded(kind, element.get_attribute("class"))
                    .await
                    .map_err(evaluate_error)?
                    .unwrap_or_default();
                if !classes.split_whitespace().any(|c| c == class) {
                    return Err(fail(format!("class list '{classes}' lacks '{class}'")));
                }
            }
        }
        Ok(())
    }

    /// Visibility of `element`; a missing element counts as not visible.
    async fn visible(&self, element: &dyn ElementHandle) -> Result<bool, DriverError> {
        match self.bounded("isVisible", element.is_visible()).await {
            Err(e) if e.is_not_found() => Ok(false),
            other => other,
        }
    }

    async fn bounded<T, F>(&self, operation: &str, future: F) -> Result<T, DriverError>
    where
        F: std::future::Future<Output = Result<T, DriverError>>,
    {
        with_timeout(self.config.step_timeout, operation, future).await
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use feature_discovery_core::{DiscoveredFeature, FeatureType};
    use feature_discovery_driver::{NodeFixture, PageFixture, StaticDriver};

    const URL: &str = "http://localhost/";

    fn page() -> PageFixture {
        PageFixture::new("Form")
            .node(NodeFixture::new("button").attr("id", "go").text("Go"))
            .node(NodeFixture::new("input").attr("id", "q").attr("type", "text"))
            .node(NodeFixture::new("button").attr("id", "off").attr("disabled", "").text("Off"))
    }

    fn case(selector: &str, steps: Vec<TestStep>, assertions: Vec<Assertion>) -> TestCase {
        TestCase {
            id: "case_1".to_string(),
            name: "case".to_string(),
            feature: Arc::new(DiscoveredFeature::new("Feature", FeatureType::Button, selector)),
            steps,
            assertions,
        }
    }

    #[tokio::test]
    async fn test_passing_case() {
        let driver = StaticDriver::with_page(URL, page());
        let case = case(
            "#q",
            vec![TestStep::new(StepAction::Fill, "#q", "fill").with_value("hello")],
            vec![Assertion::new(AssertionType::Attribute, "#q", "value").expecting(
                Expected::Attributes([("value".to_string(), "hello".to_string())].into()),
            )],
        );
        let result = TestExecutor::default().execute(&case, &driver).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.steps_completed, 1);
        assert_eq!(result.assertions_passed, 1);
    }

    #[tokio::test]
    async fn test_missing_value_fails() {
        let driver = StaticDriver::with_page(URL, page());
        let case = case("#q", vec![TestStep::new(StepAction::Fill, "#q", "fill")], vec![]);
        let result = TestExecutor::default().execute(&case, &driver).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("requires a value"));
        assert_eq!(result.steps_completed, 0);
    }

    #[tokio::test]
    async fn test_missing_feature_fails() {
        let driver = StaticDriver::with_page(URL, page());
        let case = case("#gone", vec![], vec![]);
        let result = TestExecutor::default().execute(&case, &driver).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("#gone"));
    }

    #[tokio::test]
    async fn test_assertions_on_state() {
        let driver = StaticDriver::with_page(URL, page());
        let case = case(
            "#off",
            vec![],
            vec![
                Assertion::new(AssertionType::Visible, "#off", "visible"),
                Assertion::new(AssertionType::Disabled, "#off", "disabled"),
                Assertion::new(AssertionType::Text, "#off", "text")
                    .expecting(Expected::Text("Off".to_string())),
                Assertion::new(AssertionType::Count, "button", "count")
                    .expecting(Expected::Count(2)),
                Assertion::new(AssertionType::Hidden, "#nothing", "hidden"),
            ],
        );
        let result = TestExecutor::default().execute(&case, &driver).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.assertions_passed, 5);
    }

    #[tokio::test]
    async fn test_stops_at_first_failed_assertion() {
        let driver = StaticDriver::with_page(URL, page());
        let case = case(
            "#off",
            vec![],
            vec![
                Assertion::new(AssertionType::Visible, "#off", "visible"),
                Assertion::new(AssertionType::Enabled, "#off", "enabled"),
                Assertion::new(AssertionType::Visible, "#off", "never reached"),
            ],
        );
        let result = TestExecutor::default().execute(&case, &driver).await;

        assert!(!result.success);
        assert_eq!(result.assertions_passed, 1);
        assert!(result.error.unwrap().contains("element is disabled"));
    }

    #[tokio::test]
    async fn test_click_on_disabled_button_fails_step() {
        let driver = StaticDriver::with_page(URL, page());
        let case = case(
            "#off",
            vec![TestStep::new(StepAction::Click, "#off", "click")],
            vec![],
        );
        let result = TestExecutor::default().execute(&case, &driver).await;

        assert!(!result.success);
        assert_eq!(result.steps_completed, 0);
        assert!(result.error.unwrap().starts_with("step 0 (click)"));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
