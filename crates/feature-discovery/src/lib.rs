//! # feature-discovery
//!
//! Coordinator, orchestrator and report persistence behind the
//! `feature-discovery` binary.
//!
//! ## Architecture
//!
//! This is Layer 4 in the architecture - it ties together:
//! - feature-discovery-core: Data model, configuration and report
//! - feature-discovery-driver: Backends
//! - feature-discovery-detector: Selector engine and discovery services
//! - feature-discovery-runner: Test synthesis and execution

pub mod coordinator;
pub mod orchestrator;
pub mod report;

// Re-export commonly used types
pub use coordinator::FeatureDiscoveryCoordinator;
pub use orchestrator::{FeatureDiscoveryOrchestrator, RunSummary};
pub use report::ReportWriter;
