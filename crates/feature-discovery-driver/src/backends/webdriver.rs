//! W3C WebDriver backend built on `fantoccini`.
//!
//! Talks to a running WebDriver server (chromedriver, geckodriver, Selenium)
//! at `driver.webdriver_url`.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator as By};
use serde_json::{json, Value};

use feature_discovery_core::{DriverError, DriverResult, DriverSettings, Error, PageMetrics, Result};

use super::scripts;
use crate::driver::{
    ClickOptions, Driver, ElementHandle, Locator, NavigateOptions, PathStep, ScreenshotOptions,
};

fn wd_error(e: CmdError) -> DriverError {
    DriverError::backend(e.to_string())
}

/// WebDriver key code for a named key, or the key itself for printable input.
pub fn key_code(key: &str) -> String {
    let code = match key {
        "Enter" => '\u{E007}',
        "Tab" => '\u{E004}',
        "Escape" => '\u{E00C}',
        "Backspace" => '\u{E003}',
        "Delete" => '\u{E017}',
        "Space" => '\u{E00D}',
        "ArrowLeft" => '\u{E012}',
        "ArrowUp" => '\u{E013}',
        "ArrowRight" => '\u{E014}',
        "ArrowDown" => '\u{E015}',
        "Home" => '\u{E011}',
        "End" => '\u{E010}',
        "PageUp" => '\u{E00E}',
        "PageDown" => '\u{E00F}',
        other => return other.to_string(),
    };
    code.to_string()
}

/// Driver over a WebDriver session.
pub struct WebDriverDriver {
    client: Client,
    navigation_timeout: Duration,
}

impl WebDriverDriver {
    /// Open a session against `settings.webdriver_url`.
    pub async fn connect(settings: &DriverSettings) -> Result<Self> {
        let mut capabilities = serde_json::Map::new();
        if settings.headless {
            capabilities.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--disable-gpu"] }),
            );
            capabilities.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);
        let client = builder
            .connect(&settings.webdriver_url)
            .await
            .map_err(|e| {
                Error::Other(format!(
                    "connecting to webdriver at {}: {e}",
                    settings.webdriver_url
                ))
            })?;

        Ok(Self {
            client,
            navigation_timeout: Duration::from_millis(settings.navigation_timeout_ms),
        })
    }

    /// End the WebDriver session.
    pub async fn close(&self) -> Result<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| Error::Other(format!("closing webdriver session: {e}")))
    }
}

#[async_trait]
impl Driver for WebDriverDriver {
    fn backend(&self) -> &'static str {
        "webdriver"
    }

    async fn navigate(&self, url: &str, options: NavigateOptions) -> DriverResult<()> {
        let timeout = options.timeout.unwrap_or(self.navigation_timeout);
        match tokio::time::timeout(timeout, self.client.goto(url)).await {
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
        Ok(self.client.current_url().await.map_err(wd_error)?.to_string())
    }

    async fn title(&self) -> DriverResult<String> {
        self.client.title().await.map_err(wd_error)
    }

    fn locate(&self, selector: &str) -> Box<dyn Locator> {
        Box::new(WebDriverLocator {
            client: self.client.clone(),
            selector: selector.to_string(),
        })
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        let bytes = self.client.screenshot().await.map_err(wd_error)?;
        persist(&bytes, options).await?;
        Ok(bytes)
    }

    async fn page_metrics(&self) -> DriverResult<PageMetrics> {
        let value = self
            .client
            .execute(scripts::PAGE_METRICS, Vec::new())
            .await
            .map_err(wd_error)?;
        serde_json::from_value(value)
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

struct WebDriverLocator {
    client: Client,
    selector: String,
}

#[async_trait]
impl Locator for WebDriverLocator {
    fn selector(&self) -> &str {
        &self.selector
    }

    async fn count(&self) -> DriverResult<usize> {
        Ok(self
            .client
            .find_all(By::Css(&self.selector))
            .await
            .map_err(wd_error)?
            .len())
    }

    fn nth(&self, index: usize) -> Box<dyn ElementHandle> {
        Box::new(WebDriverElement {
            client: self.client.clone(),
            selector: self.selector.clone(),
            index,
        })
    }
}

struct WebDriverElement {
    client: Client,
    selector: String,
    index: usize,
}

impl WebDriverElement {
    async fn element(&self) -> DriverResult<Element> {
        self.client
            .find_all(By::Css(&self.selector))
            .await
            .map_err(wd_error)?
            .into_iter()
            .nth(self.index)
            .ok_or_else(|| DriverError::ElementNotFound {
                selector: self.selector.clone(),
                index: self.index,
            })
    }

    async fn call(&self, body: &str) -> DriverResult<Value> {
        let element = self.element().await?;
        let argument = serde_json::to_value(&element)
            .map_err(|e| DriverError::backend(format!("encoding element: {e}")))?;
        self.client
            .execute(&scripts::as_webdriver(body), vec![argument])
            .await
            .map_err(wd_error)
    }

    async fn call_bool(&self, body: &str) -> DriverResult<bool> {
        Ok(self.call(body).await?.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl ElementHandle for WebDriverElement {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn index(&self) -> usize {
        self.index
    }

    async fn tag_name(&self) -> DriverResult<String> {
        Ok(self
            .element()
            .await?
            .tag_name()
            .await
            .map_err(wd_error)?
            .to_ascii_lowercase())
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
        self.element().await?.attr(name).await.map_err(wd_error)
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        self.element().await?.is_displayed().await.map_err(wd_error)
    }

    async fn is_enabled(&self) -> DriverResult<bool> {
        self.element().await?.is_enabled().await.map_err(wd_error)
    }

    async fn click(&self, options: ClickOptions) -> DriverResult<()> {
        if options.force {
            self.call(scripts::FORCE_CLICK).await?;
            return Ok(());
        }
        self.element().await?.click().await.map_err(wd_error)
    }

    async fn fill(&self, value: &str) -> DriverResult<()> {
        let element = self.element().await?;
        element.clear().await.map_err(wd_error)?;
        element.send_keys(value).await.map_err(wd_error)
    }

    async fn check(&self) -> DriverResult<()> {
        if self.call_bool(&scripts::set_checked(true)).await? {
            Ok(())
        } else {
            Err(DriverError::backend("check: element did not become checked"))
        }
    }

    async fn uncheck(&self) -> DriverResult<()> {
        if self.call_bool(&scripts::set_checked(false)).await? {
            Ok(())
        } else {
            Err(DriverError::backend("uncheck: element did not become unchecked"))
        }
    }

    async fn select_option(&self, value: &str) -> DriverResult<()> {
        if self.call_bool(&scripts::select_option(value)).await? {
            Ok(())
        } else {
            Err(DriverError::backend(format!(
                "selectOption: no option matching '{value}'"
            )))
        }
    }

    async fn hover(&self) -> DriverResult<()> {
        self.call(scripts::HOVER).await.map(|_| ())
    }

    async fn focus(&self) -> DriverResult<()> {
        self.call(scripts::FOCUS).await.map(|_| ())
    }

    async fn press(&self, key: &str) -> DriverResult<()> {
        self.element()
            .await?
            .send_keys(&key_code(key))
            .await
            .map_err(wd_error)
    }

    async fn structural_path(&self) -> DriverResult<Vec<PathStep>> {
        serde_json::from_value(self.call(scripts::STRUCTURAL_PATH).await?)
            .map_err(|e| DriverError::backend(format!("decoding element path: {e}")))
    }

    async fn screenshot(&self, options: ScreenshotOptions) -> DriverResult<Vec<u8>> {
        let bytes = self
            .element()
            .await?
            .screenshot()
            .await
            .map_err(wd_error)?;
        persist(&bytes, options).await?;
        Ok(bytes)
    }
}
