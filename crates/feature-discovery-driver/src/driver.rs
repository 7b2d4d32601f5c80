//! Capability traits every automation backend implements.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use feature_discovery_core::{DriverResult, PageMetrics};
use serde::Deserialize;

/// Options for [`Driver::navigate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigateOptions {
    /// Upper bound on the navigation; backend default when `None`
    pub timeout: Option<Duration>,
}

impl NavigateOptions {
    /// Navigation bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Options for [`ElementHandle::click`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickOptions {
    /// Skip actionability checks (visible, enabled)
    pub force: bool,
}

/// Options for screenshots.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    /// Also write the image to this path
    pub path: Option<PathBuf>,
}

/// One step of an element's path below `<body>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    /// Lower-case tag name
    pub tag: String,
    /// `id` attribute, if any
    #[serde(default)]
    pub id: Option<String>,
    /// 1-based position among siblings with the same tag
    pub nth_of_type: usize,
}

impl PathStep {
    /// Step for a `tag` element at `nth_of_type` without an id.
    pub fn new(tag: impl Into<String>, nth_of_type: usize) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            nth_of_type,
        }
    }

    /// Set the step's id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Uniform page-level interface over an automation backend.
///
/// A driver is one page session. It is passed explicitly through every call
/// that needs it; nothing in the upper layers holds it globally.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Stable backend name, e.g. "static".
    fn backend(&self) -> &'static str;

    /// Navigate the page to `url`.
    async fn navigate(&self, url: &str, options: NavigateOptions) -> DriverResult<()>;

    /// URL of the current page.
    async fn current_url(&self) -> DriverResult<String>;

    /// Title of the current page.
    async fn title(&self) -> DriverResult<String>;

    /// Suspend for `ms` milliseconds.
    async fn wait_for_timeout(&self, ms: u64) -> DriverResult<()> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }

    /// Lazily locate elements matching `selector`. Nothing is queried until a
    /// locator or element method is awaited.
    fn locate(&self, selector: &str) -> Box<dyn Locator>;

    /// Capture the whole page.
    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>>;

    /// Count structural elements on the page.
    async fn page_metrics(&self) -> DriverResult<PageMetrics> {
        count_page_metrics(self).await
    }
}

/// Handle to zero or more elements matching a selector.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Selector this locator resolves.
    fn selector(&self) -> &str;

    /// Number of elements currently matching.
    async fn count(&self) -> DriverResult<usize>;

    /// Element at `index` among the matches. Resolved on each use, so the
    /// handle follows the live page.
    fn nth(&self, index: usize) -> Box<dyn ElementHandle>;

    /// First matching element.
    fn first(&self) -> Box<dyn ElementHandle> {
        self.nth(0)
    }
}

/// Handle to one concrete element.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Selector the handle was resolved from.
    fn selector(&self) -> &str;

    /// Position within the selector's matches.
    fn index(&self) -> usize;

    /// Lower-case tag name.
    async fn tag_name(&self) -> DriverResult<String>;

    /// Text content, `None` when the element has none.
    async fn text_content(&self) -> DriverResult<Option<String>>;

    /// Attribute value, `None` when absent.
    async fn get_attribute(&self, name: &str) -> DriverResult<Option<String>>;

    /// Whether the element is rendered and not hidden.
    async fn is_visible(&self) -> DriverResult<bool>;

    /// Whether the element is not disabled.
    async fn is_enabled(&self) -> DriverResult<bool>;

    /// Click the element.
    async fn click(&self, options: ClickOptions) -> DriverResult<()>;

    /// Replace the element's value.
    async fn fill(&self, value: &str) -> DriverResult<()>;

    /// Check a checkbox or radio.
    async fn check(&self) -> DriverResult<()>;

    /// Uncheck a checkbox.
    async fn uncheck(&self) -> DriverResult<()>;

    /// Select the option whose value or label equals `value`.
    async fn select_option(&self, value: &str) -> DriverResult<()>;

    /// Move the pointer over the element.
    async fn hover(&self) -> DriverResult<()>;

    /// Give the element keyboard focus.
    async fn focus(&self) -> DriverResult<()>;

    /// Press a key (e.g. "Enter") while the element is focused.
    async fn press(&self, key: &str) -> DriverResult<()>;

    /// Ancestors from the first element below `<body>` down to this element,
    /// outermost first. Empty for `<html>` and `<body>` themselves.
    async fn structural_path(&self) -> DriverResult<Vec<PathStep>>;

    /// Capture the element.
    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>>;
}

/// Selectors behind each [`PageMetrics`] field.
pub const PAGE_METRIC_SELECTORS: [(&str, &str); 9] = [
    ("forms", "form"),
    ("links", "a[href]"),
    ("images", "img"),
    ("headings", "h1, h2, h3, h4, h5, h6"),
    ("tables", "table"),
    ("lists", "ul, ol"),
    ("iframes", "iframe"),
    ("buttons", "button"),
    ("inputs", "input, textarea, select"),
];

/// Compute [`PageMetrics`] through `locate().count()` alone.
pub async fn count_page_metrics<D: Driver + ?Sized>(driver: &D) -> DriverResult<PageMetrics> {
    let mut metrics = PageMetrics::default();
    for (field, selector) in PAGE_METRIC_SELECTORS {
        let count = driver.locate(selector).count().await?;
        match field {
            "forms" => metrics.forms = count,
            "links" => metrics.links = count,
            "images" => metrics.images = count,
            "headings" => metrics.headings = count,
            "tables" => metrics.tables = count,
            "lists" => metrics.lists = count,
            "iframes" => metrics.iframes = count,
            "buttons" => metrics.buttons = count,
            _ => metrics.inputs = count,
        }
    }
    Ok(metrics)
}
