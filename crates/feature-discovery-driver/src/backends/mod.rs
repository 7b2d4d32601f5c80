//! Backend selection and construction.

#[cfg(feature = "cdp")]
pub mod cdp;
#[cfg(any(feature = "cdp", feature = "webdriver"))]
mod scripts;
#[cfg(feature = "webdriver")]
pub mod webdriver;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use feature_discovery_core::{DriverSettings, Error, Result};

use crate::driver::Driver;
use crate::fixture::StaticSite;
use crate::static_driver::StaticDriver;

/// Concrete automation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// In-memory fixture pages
    Static,
    /// Chrome DevTools Protocol (Puppeteer-style)
    Cdp,
    /// W3C WebDriver
    WebDriver,
}

impl Backend {
    /// Canonical backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Static => "static",
            Backend::Cdp => "cdp",
            Backend::WebDriver => "webdriver",
        }
    }

    /// Cargo feature that compiles the backend in, if any.
    pub fn required_feature(&self) -> Option<&'static str> {
        match self {
            Backend::Static => None,
            Backend::Cdp => Some("cdp"),
            Backend::WebDriver => Some("webdriver"),
        }
    }

    /// Whether this build contains the backend.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Static => true,
            Backend::Cdp => cfg!(feature = "cdp"),
            Backend::WebDriver => cfg!(feature = "webdriver"),
        }
    }

    /// Check that the backend is compiled in and `settings` are sufficient to
    /// build it. Performs no I/O.
    pub fn check(&self, settings: &DriverSettings) -> Result<()> {
        if !self.is_available() {
            return Err(Error::UnsupportedBackend(format!(
                "{} (rebuild with the `{}` feature)",
                self.as_str(),
                self.required_feature().unwrap_or_default()
            )));
        }
        match self {
            Backend::Static if settings.fixture_path.is_none() => Err(Error::Config(
                "driver.fixture_path is required for the static backend".to_string(),
            )),
            Backend::WebDriver if settings.webdriver_url.trim().is_empty() => Err(Error::Config(
                "driver.webdriver_url is required for the webdriver backend".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" | "fixture" => Ok(Backend::Static),
            "cdp" | "puppeteer" | "chromium" | "chrome" => Ok(Backend::Cdp),
            "webdriver" | "selenium" => Ok(Backend::WebDriver),
            _ => Err(Error::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Build a driver for `backend`.
pub async fn connect(backend: Backend, settings: &DriverSettings) -> Result<Arc<dyn Driver>> {
    backend.check(settings)?;
    tracing::info!("Connecting {} backend", backend);
    match backend {
        Backend::Static => {
            let path = settings
                .fixture_path
                .as_ref()
                .ok_or_else(|| Error::Config("driver.fixture_path is missing".to_string()))?;
            let site = StaticSite::from_file(path)?;
            tracing::debug!("Loaded {} fixture pages from {}", site.pages.len(), path.display());
            Ok(Arc::new(StaticDriver::new(site)))
        }
        #[cfg(feature = "cdp")]
        Backend::Cdp => Ok(Arc::new(cdp::CdpDriver::launch(settings).await?)),
        #[cfg(feature = "webdriver")]
        Backend::WebDriver => Ok(Arc::new(webdriver::WebDriverDriver::connect(settings).await?)),
        #[allow(unreachable_patterns)]
        other => Err(Error::UnsupportedBackend(other.as_str().to_string())),
    }
}
