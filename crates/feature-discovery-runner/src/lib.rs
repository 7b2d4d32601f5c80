//! # feature-discovery-runner
//!
//! Turns discovered features into test cases and runs them.
//!
//! This crate provides:
//! - `TestCaseSynthesizer`: per-feature-type test case generation
//! - `ValueSource` / `NavigationHandler` strategy traits
//! - `TestExecutor`: bounded, non-failing execution against a `Driver`
//!
//! ## Architecture
//!
//! This is Layer 3 in the architecture - it depends on feature-discovery-core,
//! feature-discovery-driver and feature-discovery-detector.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod executor;
pub mod synthesizer;

// Re-export commonly used types
pub use executor::{ExecutionError, ExecutorConfig, TestExecutor, DEFAULT_STEP_TIMEOUT};
pub use synthesizer::{
    ClickEachLink, InputKindValues, NavigationHandler, TestCaseSynthesizer, ValueSource,
    DEFAULT_FILL_VALUE, PAGE_ROOT_SELECTOR,
};
