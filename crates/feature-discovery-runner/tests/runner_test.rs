//! End-to-end synthesis and execution against the static backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use feature_discovery_core::{
    Assertion, AssertionType, DiscoveredFeature, DiscoverySettings, DriverError, DriverResult,
    FeatureType, StepAction, TestCase, TestStep,
};
use feature_discovery_detector::DiscoveryService;
use feature_discovery_driver::{
    Driver, Locator, NavigateOptions, NodeFixture, PageFixture, ScreenshotOptions, StaticDriver,
    StaticSite,
};
use feature_discovery_runner::{
    ClickEachLink, ExecutorConfig, InputKindValues, TestCaseSynthesizer, TestExecutor,
};

const APP: &str = "http://localhost/app";

fn nav() -> NodeFixture {
    NodeFixture::new("nav")
        .attr("id", "main-nav")
        .child(NodeFixture::new("a").attr("href", "/app").text("Home"))
        .child(NodeFixture::new("a").attr("href", "/about").text("About"))
}

fn site() -> StaticSite {
    StaticSite::new()
        .page(
            APP,
            PageFixture::new("App")
                .node(nav())
                .node(
                    NodeFixture::new("form")
                        .child(
                            NodeFixture::new("input")
                                .attr("type", "email")
                                .attr("name", "email"),
                        )
                        .child(
                            NodeFixture::new("input")
                                .attr("type", "checkbox")
                                .attr("id", "remember"),
                        )
                        .child(
                            NodeFixture::new("button")
                                .attr("data-testid", "submit")
                                .text("Submit"),
                        ),
                )
                .node(
                    NodeFixture::new("div")
                        .attr("data-component", "ProfileCard")
                        .child(NodeFixture::new("p").text("Ada")),
                ),
        )
        .page(
            "http://localhost/about",
            PageFixture::new("About").node(nav()),
        )
}

async fn discovered(driver: &StaticDriver) -> Vec<Arc<DiscoveredFeature>> {
    driver
        .navigate(APP, NavigateOptions::default())
        .await
        .unwrap();
    DiscoveryService::new(DiscoverySettings::default())
        .discover_features(driver)
        .await
}

fn executor() -> TestExecutor {
    TestExecutor::new(ExecutorConfig::default()).with_start_url(APP)
}

#[tokio::test]
async fn test_discovered_features_pass() {
    let driver = StaticDriver::new(site());
    let features = discovered(&driver).await;
    assert!(!features.is_empty());

    let cases = TestCaseSynthesizer::new()
        .with_value_source(Arc::new(InputKindValues))
        .generate_test_cases(&features);
    assert_eq!(cases.len(), features.len());
    for (case, feature) in cases.iter().zip(&features) {
        assert!(Arc::ptr_eq(&case.feature, feature));
    }

    let results = executor().execute_batch(&cases, &driver).await;
    assert_eq!(results.len(), cases.len());
    for (result, case) in results.iter().zip(&cases) {
        assert_eq!(result.test_case_id, case.id);
        assert!(result.success, "{}: {:?}", case.id, result.error);
        assert_eq!(result.steps_completed, case.steps.len());
        assert_eq!(result.assertions_passed, case.assertions.len());
    }
}

#[tokio::test]
async fn test_click_each_link_follows_navigation() {
    let driver = StaticDriver::new(site());
    let features = discovered(&driver).await;
    let navigation: Vec<Arc<DiscoveredFeature>> = features
        .into_iter()
        .filter(|f| f.feature_type == FeatureType::Navigation)
        .collect();
    assert_eq!(navigation.len(), 1);

    let cases = TestCaseSynthesizer::new()
        .with_navigation_handler(Arc::new(ClickEachLink))
        .generate_test_cases(&navigation);
    assert_eq!(cases[0].steps.len(), 2);

    let result = executor().execute(&cases[0], &driver).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(driver.current_url().await.unwrap(), "http://localhost/about");
}

#[tokio::test]
async fn test_start_url_resets_state() {
    let driver = StaticDriver::new(site());
    let features = discovered(&driver).await;
    let cases = TestCaseSynthesizer::new().generate_test_cases(&features);

    // Leave the start page; every case must still find its feature.
    driver
        .navigate("http://localhost/about", NavigateOptions::default())
        .await
        .unwrap();
    let results = executor().execute_batch(&cases, &driver).await;
    assert!(results.iter().all(|r| r.success));
}

#[tokio::test]
async fn test_batch_keeps_order_with_failures() {
    let driver = StaticDriver::with_page(APP, PageFixture::new("App").node(nav()));
    let feature = Arc::new(DiscoveredFeature::new("Nav", FeatureType::Navigation, "#main-nav"));
    let case = |id: &str, selector: &str| TestCase {
        id: id.to_string(),
        name: id.to_string(),
        feature: Arc::clone(&feature),
        steps: Vec::new(),
        assertions: vec![Assertion::new(AssertionType::Visible, selector, "visible")],
    };
    let cases = vec![
        case("a_1", "#main-nav"),
        case("a_2", "#missing"),
        case("a_3", "#main-nav a"),
    ];

    let results = TestExecutor::default().execute_batch(&cases, &driver).await;
    let ids: Vec<&str> = results.iter().map(|r| r.test_case_id.as_str()).collect();
    assert_eq!(ids, ["a_1", "a_2", "a_3"]);
    let outcomes: Vec<bool> = results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, [true, false, true]);
    assert!(TestExecutor::default().execute_batch(&[], &driver).await.is_empty());
}

#[tokio::test]
async fn test_screenshot_step_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nav.png");
    let driver = StaticDriver::with_page(APP, PageFixture::new("App").node(nav()));
    let case = TestCase {
        id: "navigation_1".to_string(),
        name: "Capture".to_string(),
        feature: Arc::new(DiscoveredFeature::new("Nav", FeatureType::Navigation, "#main-nav")),
        steps: vec![TestStep::new(StepAction::Screenshot, "#main-nav", "capture")
            .with_value(path.to_string_lossy())],
        assertions: Vec::new(),
    };

    let result = TestExecutor::default().execute(&case, &driver).await;
    assert!(result.success, "{:?}", result.error);
    assert!(path.exists());
}

/// Delegates to a static page but fails, stalls or panics on navigation.
struct FaultyDriver {
    inner: StaticDriver,
    fault: Fault,
}

enum Fault {
    Reject,
    Stall,
    Panic,
}

#[async_trait]
impl Driver for FaultyDriver {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    async fn navigate(&self, url: &str, _options: NavigateOptions) -> DriverResult<()> {
        match self.fault {
            Fault::Reject => Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            Fault::Stall => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
            Fault::Panic => panic!("navigation exploded"),
        }
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.inner.current_url().await
    }

    async fn title(&self) -> DriverResult<String> {
        self.inner.title().await
    }

    fn locate(&self, selector: &str) -> Box<dyn Locator> {
        self.inner.locate(selector)
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        self.inner.screenshot(options).await
    }
}

fn faulty(fault: Fault) -> FaultyDriver {
    FaultyDriver {
        inner: StaticDriver::with_page(APP, PageFixture::new("App").node(nav())),
        fault,
    }
}

fn nav_case() -> TestCase {
    TestCase {
        id: "navigation_1".to_string(),
        name: "Navigate".to_string(),
        feature: Arc::new(DiscoveredFeature::new("Nav", FeatureType::Navigation, "#main-nav")),
        steps: vec![TestStep::new(StepAction::Click, "#main-nav a", "click")],
        assertions: vec![Assertion::new(AssertionType::Visible, "body", "visible")],
    }
}

#[tokio::test]
async fn test_rejected_navigation_is_a_failed_result() {
    let driver = faulty(Fault::Reject);
    let result = executor().execute(&nav_case(), &driver).await;

    assert!(!result.success);
    assert_eq!(result.steps_completed, 0);
    assert!(result.error.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_stalled_navigation_times_out() {
    let driver = faulty(Fault::Stall);
    let config = ExecutorConfig {
        navigation_timeout: Duration::from_millis(50),
        ..ExecutorConfig::default()
    };
    let result = TestExecutor::new(config)
        .with_start_url(APP)
        .execute(&nav_case(), &driver)
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("Timeout"));
}

#[tokio::test]
async fn test_driver_panic_is_contained() {
    let driver = faulty(Fault::Panic);
    let result = executor().execute(&nav_case(), &driver).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("navigation exploded"));
}

#[tokio::test]
async fn test_without_start_url_runs_on_current_page() {
    let driver = faulty(Fault::Reject);
    let result = TestExecutor::default().execute(&nav_case(), &driver).await;
    assert!(result.success, "{:?}", result.error);
}
