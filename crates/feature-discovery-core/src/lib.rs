//! # feature-discovery-core
//!
//! Core types for feature discovery.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other feature-discovery crates. It provides:
//!
//! - Discovered feature tree types (DiscoveredFeature, FeatureType, Attributes)
//! - Test case types (TestStep, Assertion, TestCase, TestResult)
//! - Discovery report projection (DiscoveryReport, Statistics, PageMetrics)
//! - YAML configuration
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other feature-discovery crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod feature;
pub mod report;
pub mod test_case;

// Re-export commonly used types
pub use config::{
    DiscoveryConfig, DiscoveryMode, DiscoverySettings, DriverSettings, ExecutionSettings,
    OutputSettings,
};
pub use error::{DriverError, DriverResult, Error, Result};
pub use feature::{Action, Attributes, DiscoveredFeature, ElementState, FeatureType};
pub use report::{CategoryOutcome, CategoryResult, DiscoveryReport, PageMetrics, Statistics};
pub use test_case::{
    Assertion, AssertionType, Expected, StepAction, TestCase, TestResult, TestStep,
};
