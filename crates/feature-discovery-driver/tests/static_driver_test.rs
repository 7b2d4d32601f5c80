//! Integration tests for the static backend through the driver traits.

use std::sync::Arc;
use std::time::Duration;

use feature_discovery_core::{DriverError, PageMetrics};
use feature_discovery_driver::{
    with_timeout, ClickOptions, Driver, NavigateOptions, NodeFixture, PageFixture, PathStep,
    ScreenshotOptions, StaticDriver, StaticSite,
};

const HOME: &str = "http://localhost/";
const ABOUT: &str = "http://localhost/about";

fn site() -> StaticSite {
    StaticSite::new()
        .page(
            HOME,
            PageFixture::new("Home")
                .node(
                    NodeFixture::new("nav")
                        .child(NodeFixture::new("a").attr("href", "/about").text("About"))
                        .child(NodeFixture::new("a").attr("href", "#top").text("Top")),
                )
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
                                .attr("id", "terms"),
                        )
                        .child(
                            NodeFixture::new("select")
                                .attr("name", "plan")
                                .child(
                                    NodeFixture::new("option").attr("value", "free").text("Free"),
                                )
                                .child(
                                    NodeFixture::new("option").attr("value", "pro").text("Pro"),
                                ),
                        )
                        .child(NodeFixture::new("button").attr("type", "submit").text("Send"))
                        .child(NodeFixture::new("button").attr("disabled", "").text("Locked")),
                )
                .node(NodeFixture::new("button").hidden().text("Ghost")),
        )
        .page(ABOUT, PageFixture::new("About us").node(NodeFixture::new("h1").text("About")))
}

async fn driver() -> StaticDriver {
    let driver = StaticDriver::new(site());
    driver
        .navigate(HOME, NavigateOptions::default())
        .await
        .unwrap();
    driver
}

#[tokio::test]
async fn test_navigate_and_title() {
    let driver = driver().await;
    assert_eq!(driver.current_url().await.unwrap(), HOME);
    assert_eq!(driver.title().await.unwrap(), "Home");
    assert_eq!(driver.backend(), "static");
}

#[tokio::test]
async fn test_navigate_unknown_url_fails() {
    let driver = StaticDriver::new(site());
    let err = driver
        .navigate("http://localhost/missing", NavigateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Navigation { .. }));
    assert_eq!(driver.current_url().await.unwrap(), "about:blank");
}

#[tokio::test]
async fn test_locator_count_and_nth() {
    let driver = driver().await;
    let buttons = driver.locate("button");
    assert_eq!(buttons.count().await.unwrap(), 3);

    let send = buttons.nth(0);
    assert_eq!(send.index(), 0);
    assert_eq!(send.selector(), "button");
    assert_eq!(send.text_content().await.unwrap().as_deref(), Some("Send"));
    assert!(send.is_visible().await.unwrap());
    assert!(send.is_enabled().await.unwrap());

    let locked = buttons.nth(1);
    assert!(!locked.is_enabled().await.unwrap());

    let ghost = buttons.nth(2);
    assert!(!ghost.is_visible().await.unwrap());
}

#[tokio::test]
async fn test_missing_element_is_not_found() {
    let driver = driver().await;
    let err = driver.locate("button").nth(9).tag_name().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_invalid_selector_is_backend_error() {
    let driver = driver().await;
    let err = driver.locate("a + b").count().await.unwrap_err();
    assert!(matches!(err, DriverError::Backend(_)));
}

#[tokio::test]
async fn test_fill_sets_value() {
    let driver = driver().await;
    let email = driver.locate("input[name='email']").first();
    email.fill("test@example.com").await.unwrap();
    assert_eq!(
        email.get_attribute("value").await.unwrap().as_deref(),
        Some("test@example.com")
    );
}

#[tokio::test]
async fn test_fill_rejects_checkbox() {
    let driver = driver().await;
    let err = driver.locate("#terms").first().fill("x").await.unwrap_err();
    assert!(matches!(err, DriverError::Backend(_)));
}

#[tokio::test]
async fn test_check_and_uncheck() {
    let driver = driver().await;
    let terms = driver.locate("#terms").first();
    terms.check().await.unwrap();
    assert!(terms.get_attribute("checked").await.unwrap().is_some());
    terms.uncheck().await.unwrap();
    assert!(terms.get_attribute("checked").await.unwrap().is_none());
}

#[tokio::test]
async fn test_select_option_by_value_and_text() {
    let driver = driver().await;
    let plan = driver.locate("select").first();
    plan.select_option("pro").await.unwrap();
    assert_eq!(plan.get_attribute("value").await.unwrap().as_deref(), Some("pro"));
    plan.select_option("Free").await.unwrap();
    assert_eq!(plan.get_attribute("value").await.unwrap().as_deref(), Some("free"));
    assert!(plan.select_option("enterprise").await.is_err());
}

#[tokio::test]
async fn test_click_disabled_requires_force() {
    let driver = driver().await;
    let locked = driver.locate("button[disabled]").first();
    assert!(locked.click(ClickOptions::default()).await.is_err());
    locked.click(ClickOptions { force: true }).await.unwrap();
}

#[tokio::test]
async fn test_click_link_navigates() {
    let driver = driver().await;
    driver
        .locate("nav a")
        .first()
        .click(ClickOptions::default())
        .await
        .unwrap();
    assert_eq!(driver.current_url().await.unwrap(), ABOUT);
    assert_eq!(driver.title().await.unwrap(), "About us");
}

#[tokio::test]
async fn test_click_anchor_stays_on_page() {
    let driver = driver().await;
    driver
        .locate("nav a")
        .nth(1)
        .click(ClickOptions::default())
        .await
        .unwrap();
    assert_eq!(driver.current_url().await.unwrap(), HOME);
}

#[tokio::test]
async fn test_press_records_key() {
    let driver = driver().await;
    driver.locate("input").first().press("Enter").await.unwrap();
    assert_eq!(driver.pressed_keys().await, vec!["Enter".to_string()]);
}

#[tokio::test]
async fn test_structural_path_locates_element() {
    let driver = driver().await;
    let path = driver
        .locate("form button")
        .nth(1)
        .structural_path()
        .await
        .unwrap();
    assert_eq!(path, vec![PathStep::new("form", 1), PathStep::new("button", 2)]);

    let selector = "body > form:nth-of-type(1) > button:nth-of-type(2)";
    let locator = driver.locate(selector);
    assert_eq!(locator.count().await.unwrap(), 1);
    assert_eq!(
        locator.first().text_content().await.unwrap().as_deref(),
        Some("Locked")
    );
}

#[tokio::test]
async fn test_page_metrics() {
    let driver = driver().await;
    let metrics = driver.page_metrics().await.unwrap();
    assert_eq!(
        metrics,
        PageMetrics {
            forms: 1,
            links: 2,
            buttons: 3,
            inputs: 3,
            ..PageMetrics::default()
        }
    );
}

#[tokio::test]
async fn test_screenshot_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.png");
    let driver = driver().await;
    let bytes = driver
        .screenshot(ScreenshotOptions {
            path: Some(path.clone()),
        })
        .await
        .unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}

#[tokio::test]
async fn test_hidden_element_screenshot_fails() {
    let driver = driver().await;
    let ghost = driver.locate("button").nth(2);
    assert!(ghost.screenshot(ScreenshotOptions::default()).await.is_err());
}

#[tokio::test]
async fn test_driver_as_trait_object() {
    let driver: Arc<dyn Driver> = Arc::new(driver().await);
    let count = with_timeout(Duration::from_secs(1), "count", driver.locate("a").count())
        .await
        .unwrap();
    assert_eq!(count, 2);
}
