//! Chrome DevTools Protocol backend built on `chromiumoxide`.
//!
//! Mirrors Puppeteer's model: a launched browser, one page, elements looked up
//! by CSS selector on every call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use feature_discovery_core::{DriverError, DriverResult, DriverSettings, Error, PageMetrics, Result};

use super::scripts;
use crate::driver::{
    ClickOptions, Driver, ElementHandle, Locator, NavigateOptions, PathStep, ScreenshotOptions,
};

fn cdp_error(e: chromiumoxide::error::CdpError) -> DriverError {
    DriverError::backend(e.to_string())
}

/// Driver over a Chromium instance launched through CDP.
pub struct CdpDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl CdpDriver {
    /// Launch Chromium and open a blank page.
    pub async fn launch(settings: &DriverSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(Error::Config)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Other(format!("launching chromium: {e}")))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Other(format!("opening page: {e}")))?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            navigation_timeout: Duration::from_millis(settings.navigation_timeout_ms),
        })
    }

    /// Close the browser.
    pub async fn close(&self) -> Result<()> {
        self.browser
            .lock()
            .await
            .close()
            .await
            .map_err(|e| Error::Other(format!("closing chromium: {e}")))?;
        Ok(())
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl Driver for CdpDriver {
    fn backend(&self) -> &'static str {
        "cdp"
    }

    async fn navigate(&self, url: &str, options: NavigateOptions) -> DriverResult<()> {
        let timeout = options.timeout.unwrap_or(self.navigation_timeout);
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(DriverError::Timeout {
                operation: "navigate".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn title(&self) -> DriverResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    fn locate(&self, selector: &str) -> Box<dyn Locator> {
        Box::new(CdpLocator {
            page: Arc::new(self.page.clone()),
            selector: selector.to_string(),
        })
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = self.page.screenshot(params).await.map_err(cdp_error)?;
        persist(&bytes, options).await?;
        Ok(bytes)
    }

    async fn page_metrics(&self) -> DriverResult<PageMetrics> {
        self.page
            .evaluate(scripts::as_expression(scripts::PAGE_METRICS))
            .await
            .map_err(cdp_error)?
            .into_value::<PageMetrics>()
            .map_err(|e| DriverError::backend(format!("decoding page metrics: {e}")))
    }
}

async fn persist(bytes: &[u8], options: ScreenshotOptions) -> DriverResult<()> {
    if let Some(path) = options.path {
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DriverError::backend(format!("writing {}: {e}", path.display())))?;
    }
    Ok(())
}

struct CdpLocator {
    page: Arc<Page>,
    selector: String,
}

#[async_trait]
impl Locator for CdpLocator {
    fn selector(&self) -> &str {
        &self.selector
    }

    async fn count(&self) -> DriverResult<usize> {
        Ok(self
            .page
            .find_elements(self.selector.as_str())
            .await
            .map_err(cdp_error)?
            .len())
    }

    fn nth(&self, index: usize) -> Box<dyn ElementHandle> {
        Box::new(CdpElement {
            page: Arc::clone(&self.page),
            selector: self.selector.clone(),
            index,
        })
    }
}

struct CdpElement {
    page: Arc<Page>,
    selector: String,
    index: usize,
}

impl CdpElement {
    async fn element(&self) -> DriverResult<Element> {
        self.page
            .find_elements(self.selector.as_str())
            .await
            .map_err(cdp_error)?
            .into_iter()
            .nth(self.index)
            .ok_or_else(|| DriverError::ElementNotFound {
                selector: self.selector.clone(),
                index: self.index,
            })
    }

    async fn call(&self, body: &str) -> DriverResult<serde_json::Value> {
        let element = self.element().await?;
        let returns = element
            .call_js_fn(scripts::as_function(body), false)
            .await
            .map_err(cdp_error)?;
        Ok(returns.result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn call_bool(&self, body: &str) -> DriverResult<bool> {
        Ok(self.call(body).await?.as_bool().unwrap_or(false))
    }

    async fn ensure_actionable(&self, action: &str) -> DriverResult<()> {
        if !self.call_bool(scripts::IS_VISIBLE).await? {
            return Err(DriverError::backend(format!("{action}: element is not visible")));
        }
        if !self.call_bool(scripts::IS_ENABLED).await? {
            return Err(DriverError::backend(format!("{action}: element is disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for CdpElement {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn index(&self) -> usize {
        self.index
    }

    async fn tag_name(&self) -> DriverResult<String> {
        Ok(self
            .call(scripts::TAG_NAME)
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn text_content(&self) -> DriverResult<Option<String>> {
        Ok(self
            .call(scripts::TEXT_CONTENT)
            .await?
            .as_str()
            .map(str::to_string)
            .filter(|t| !t.is_empty()))
    }

    async fn get_attribute(&self, name: &str) -> DriverResult<Option<String>> {
        if name.eq_ignore_ascii_case("value") {
            return Ok(self.call(scripts::VALUE).await?.as_str().map(str::to_string));
        }
        self.element()
            .await?
            .attribute(name)
            .await
            .map_err(cdp_error)
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        self.call_bool(scripts::IS_VISIBLE).await
    }

    async fn is_enabled(&self) -> DriverResult<bool> {
        self.call_bool(scripts::IS_ENABLED).await
    }

    async fn click(&self, options: ClickOptions) -> DriverResult<()> {
        if options.force {
            self.call(scripts::FORCE_CLICK).await?;
            return Ok(());
        }
        self.ensure_actionable("click").await?;
        self.element().await?.click().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn fill(&self, value: &str) -> DriverResult<()> {
        self.ensure_actionable("fill").await?;
        self.call(scripts::CLEAR_VALUE).await?;
        self.element()
            .await?
            .type_str(value)
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn check(&self) -> DriverResult<()> {
        self.ensure_actionable("check").await?;
        if self.call_bool(&scripts::set_checked(true)).await? {
            Ok(())
        } else {
            Err(DriverError::backend("check: element did not become checked"))
        }
    }

    async fn uncheck(&self) -> DriverResult<()> {
        self.ensure_actionable("uncheck").await?;
        if self.call_bool(&scripts::set_checked(false)).await? {
            Ok(())
        } else {
            Err(DriverError::backend("uncheck: element did not become unchecked"))
        }
    }

    async fn select_option(&self, value: &str) -> DriverResult<()> {
        self.ensure_actionable("selectOption").await?;
        if self.call_bool(&scripts::select_option(value)).await? {
            Ok(())
        } else {
            Err(DriverError::backend(format!(
                "selectOption: no option matching '{value}'"
            )))
        }
    }

    async fn hover(&self) -> DriverResult<()> {
        self.element().await?.hover().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn focus(&self) -> DriverResult<()> {
        self.element().await?.focus().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn press(&self, key: &str) -> DriverResult<()> {
        self.element()
            .await?
            .press_key(key)
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn structural_path(&self) -> DriverResult<Vec<PathStep>> {
        serde_json::from_value(self.call(scripts::STRUCTURAL_PATH).await?)
            .map_err(|e| DriverError::backend(format!("decoding element path: {e}")))
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        let bytes = self
            .element()
            .await?
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(cdp_error)?;
        persist(&bytes, options).await?;
        Ok(bytes)
    }
}
