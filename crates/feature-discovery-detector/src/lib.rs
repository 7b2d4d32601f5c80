//! # feature-discovery-detector
//!
//! Feature discovery engine.
//!
//! This crate provides:
//! - Selector generation, validation and optimization
//! - One-shot element inspection
//! - Category discovery services (components, navigation, inputs, buttons)
//! - A generic count-then-index service for any backend
//! - Priority-ordered aggregate discovery with per-category outcomes
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on feature-discovery-core
//! and talks to pages only through the feature-discovery-driver traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod discovery;
pub mod inspect;
pub mod selector;
pub mod services;

// Re-export commonly used types
pub use discovery::{
    DiscoveryContext, DiscoveryOutcome, DiscoveryService, FeatureDiscovery, RefIdGenerator,
};
pub use inspect::ElementSnapshot;
pub use selector::{
    generate_selector, is_valid_selector, optimize_selector, ElementInfo, SelectorGenerator,
};
pub use services::{
    get_test_value_for_input, ButtonDiscovery, ComponentDiscovery, GenericDiscoveryService,
    InputDiscovery, InputKind, NavigationDiscovery,
};
