//! End-to-end runs through the coordinator and orchestrator.

use std::sync::Arc;

use async_trait::async_trait;
use feature_discovery::{FeatureDiscoveryCoordinator, FeatureDiscoveryOrchestrator, ReportWriter};
use feature_discovery_core::{
    AssertionType, CategoryResult, DiscoveredFeature, DiscoveryConfig, DriverError, DriverResult,
    Error, FeatureType, StepAction,
};
use feature_discovery_detector::{
    ButtonDiscovery, DiscoveryContext, DiscoveryService, FeatureDiscovery,
};
use feature_discovery_driver::{Driver, NodeFixture, PageFixture, StaticDriver, StaticSite};

const URL: &str = "http://localhost/form";

fn submit_page() -> PageFixture {
    PageFixture::new("Form").node(
        NodeFixture::new("button")
            .attr("data-testid", "submit-btn")
            .text("Submit"),
    )
}

#[tokio::test]
async fn test_single_button_end_to_end() {
    let driver = StaticDriver::new(StaticSite::new().page(URL, submit_page()));
    let coordinator = FeatureDiscoveryCoordinator::new(&DiscoveryConfig::default());

    let report = coordinator.execute(&driver, URL).await.unwrap();

    assert_eq!(report.features_discovered(), 1);
    let feature = &report.features()[0];
    assert_eq!(feature.feature_type, FeatureType::Button);
    assert_eq!(feature.selector, "[data-testid=\"submit-btn\"]");

    assert_eq!(report.test_cases().len(), 1);
    let case = &report.test_cases()[0];
    assert!(Arc::ptr_eq(&case.feature, feature));
    assert_eq!(case.steps.len(), 1);
    assert_eq!(case.steps[0].action, StepAction::Click);
    let kinds: Vec<AssertionType> = case.assertions.iter().map(|a| a.assertion_type).collect();
    assert_eq!(kinds, [AssertionType::Visible, AssertionType::Enabled]);

    assert_eq!(report.test_results().len(), 1);
    assert!(report.test_results()[0].success);
    assert_eq!(report.failed_tests(), 0);
    assert_eq!(report.backend(), Some("static"));
    assert_eq!(report.title(), Some("Form"));
    assert_eq!(report.statistics().total(), 1);
}

#[tokio::test]
async fn test_empty_page_end_to_end() {
    let driver = StaticDriver::new(StaticSite::new().page(URL, PageFixture::new("")));
    let coordinator = FeatureDiscoveryCoordinator::new(&DiscoveryConfig::default());

    let report = coordinator.execute(&driver, URL).await.unwrap();

    assert_eq!(report.features_discovered(), 0);
    assert!(report.features().is_empty());
    assert!(report.test_cases().is_empty());
    assert!(report.test_results().is_empty());
    assert_eq!(report.statistics().total(), 0);
    assert_eq!(report.title(), None);
}

#[tokio::test]
async fn test_generation_gates() {
    let driver = StaticDriver::new(StaticSite::new().page(URL, submit_page()));

    let mut config = DiscoveryConfig::default();
    config.execution.execute_tests = false;
    let report = FeatureDiscoveryCoordinator::new(&config)
        .execute(&driver, URL)
        .await
        .unwrap();
    assert_eq!(report.test_cases().len(), 1);
    assert!(report.test_results().is_empty());

    config.execution.generate_tests = false;
    let report = FeatureDiscoveryCoordinator::new(&config)
        .execute(&driver, URL)
        .await
        .unwrap();
    assert_eq!(report.features_discovered(), 1);
    assert!(report.test_cases().is_empty());
}

#[tokio::test]
async fn test_page_screenshot_is_embedded() {
    let driver = StaticDriver::new(StaticSite::new().page(URL, submit_page()));
    let mut config = DiscoveryConfig::default();
    config.output.capture_screenshot = true;

    let report = FeatureDiscoveryCoordinator::new(&config)
        .execute(&driver, URL)
        .await
        .unwrap();
    assert!(report.screenshot().unwrap().starts_with("iVBORw0KGgo"));
}

#[tokio::test]
async fn test_unreachable_url_is_an_error() {
    let driver = StaticDriver::new(StaticSite::new().page(URL, submit_page()));
    let coordinator = FeatureDiscoveryCoordinator::new(&DiscoveryConfig::default());

    let result = coordinator.execute(&driver, "http://localhost/missing").await;
    assert!(matches!(
        result,
        Err(Error::Driver(DriverError::Navigation { .. }))
    ));
}

struct BrokenDiscovery;

#[async_trait]
impl FeatureDiscovery for BrokenDiscovery {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn priority(&self) -> u32 {
        100
    }

    async fn discover(
        &self,
        _driver: &dyn Driver,
        _context: &DiscoveryContext,
    ) -> DriverResult<Vec<DiscoveredFeature>> {
        Err(DriverError::backend("heuristic crashed"))
    }
}

#[tokio::test]
async fn test_failing_category_does_not_abort_run() {
    let driver = StaticDriver::new(StaticSite::new().page(URL, submit_page()));
    let config = DiscoveryConfig::default();
    let mut discovery = DiscoveryService::empty(config.discovery.clone());
    discovery.add_service(Arc::new(BrokenDiscovery));
    discovery.add_service(Arc::new(ButtonDiscovery::new()));

    let report = FeatureDiscoveryCoordinator::new(&config)
        .with_discovery(discovery)
        .execute(&driver, URL)
        .await
        .unwrap();

    assert_eq!(report.features_discovered(), 1);
    let categories = report.categories();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].category, "broken");
    assert!(matches!(
        &categories[0].result,
        CategoryResult::Empty { reason } if reason.contains("heuristic crashed")
    ));
    assert!(!categories[1].is_failure());
}

fn write_fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let site = StaticSite::new().page(URL, submit_page());
    let path = dir.join("site.yaml");
    std::fs::write(&path, serde_yaml::to_string(&site).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_orchestrator_persists_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = DiscoveryConfig::default();
    config.driver.backend = "static".to_string();
    config.driver.fixture_path = Some(write_fixture(dir.path()));
    config.output.directory = dir.path().join("reports");

    let orchestrator = FeatureDiscoveryOrchestrator::new(config).unwrap();
    let summary = orchestrator.run(URL).await.unwrap();

    assert!(summary.path.starts_with(dir.path().join("reports")));
    let name = summary.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("report-") && name.ends_with(".json"));

    let loaded = ReportWriter::load(&summary.path).unwrap();
    assert_eq!(loaded.features_discovered(), loaded.features().len());
    assert_eq!(loaded.statistics().total(), loaded.features_discovered());
    assert_eq!(loaded.test_results().len(), 1);
    assert_eq!(loaded.url(), URL);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary.path).unwrap()).unwrap();
    assert_eq!(json["featuresDiscovered"], 1);
    assert_eq!(json["statistics"]["byType"]["button"], 1);
}

#[tokio::test]
async fn test_failed_navigation_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = DiscoveryConfig::default();
    config.driver.fixture_path = Some(write_fixture(dir.path()));
    config.output.directory = dir.path().join("reports");

    let orchestrator = FeatureDiscoveryOrchestrator::new(config).unwrap();
    assert!(orchestrator.run("http://localhost/elsewhere").await.is_err());
    assert!(!dir.path().join("reports").exists());
}

#[test]
fn test_unsupported_backend_fails_before_connecting() {
    let mut config = DiscoveryConfig::default();
    config.driver.backend = "netscape".to_string();
    // A fixture that does not exist: construction must not touch it.
    config.driver.fixture_path = Some("/nonexistent/site.yaml".into());
    assert!(matches!(
        FeatureDiscoveryOrchestrator::new(config),
        Err(Error::UnsupportedBackend(name)) if name == "netscape"
    ));

    if !cfg!(feature = "cdp") {
        let mut config = DiscoveryConfig::default();
        config.driver.backend = "cdp".to_string();
        assert!(matches!(
            FeatureDiscoveryOrchestrator::new(config),
            Err(Error::UnsupportedBackend(_))
        ));
    }
}
