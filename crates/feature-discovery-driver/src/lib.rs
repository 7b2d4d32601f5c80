//! # feature-discovery-driver
//!
//! Driver abstraction for feature discovery.
//!
//! This crate provides:
//! - The `Driver` / `Locator` / `ElementHandle` capability traits
//! - Per-operation timeout helper
//! - A dependency-free static backend driven by site fixtures
//! - Chrome DevTools Protocol backend (feature `cdp`)
//! - W3C WebDriver backend (feature `webdriver`)
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on
//! feature-discovery-core. Every upper layer talks to pages exclusively
//! through the traits defined here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backends;
pub mod driver;
pub mod fixture;
pub mod matcher;
pub mod static_driver;
pub mod timeout;

// Re-export commonly used types
pub use backends::{connect, Backend};
pub use driver::{
    count_page_metrics, ClickOptions, Driver, ElementHandle, Locator, NavigateOptions, PathStep,
    ScreenshotOptions,
};
pub use fixture::{NodeFixture, PageFixture, StaticSite};
pub use matcher::SelectorList;
pub use static_driver::StaticDriver;
pub use timeout::with_timeout;
