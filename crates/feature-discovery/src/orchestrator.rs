//! Backend selection and full runs.

use std::path::PathBuf;

use feature_discovery_core::{DiscoveryConfig, DiscoveryReport, Error, Result};
use feature_discovery_driver::{connect, Backend, Driver};

use crate::coordinator::FeatureDiscoveryCoordinator;
use crate::report::ReportWriter;

/// Result of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// The assembled report
    pub report: DiscoveryReport,
    /// Where the report was written
    pub path: PathBuf,
}

/// Selects a backend, connects a driver and drives one run to a persisted
/// report.
///
/// Construction validates the configuration and the backend; nothing is
/// connected or navigated until [`run`](Self::run).
pub struct FeatureDiscoveryOrchestrator {
    config: DiscoveryConfig,
    backend: Backend,
    coordinator: FeatureDiscoveryCoordinator,
}

impl FeatureDiscoveryOrchestrator {
    /// Validate `config` and resolve its backend.
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        let backend: Backend = config.driver.backend.parse()?;
        backend.check(&config.driver)?;
        tracing::debug!("Orchestrator configured for {} backend", backend);
        let coordinator = FeatureDiscoveryCoordinator::new(&config);
        Ok(Self {
            config,
            backend,
            coordinator,
        })
    }

    /// Selected backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Effective configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Connect the backend, run against `url` and write the report.
    pub async fn run(&self, url: &str) -> Result<RunSummary> {
        let url = checked_url(url)?;
        let driver = connect(self.backend, &self.config.driver).await?;
        self.run_with_driver(driver.as_ref(), url).await
    }

    /// Run against `url` on an already connected driver and write the report.
    pub async fn run_with_driver(&self, driver: &dyn Driver, url: &str) -> Result<RunSummary> {
        let url = checked_url(url)?;
        let report = self.coordinator.execute(driver, url).await?;
        let path = ReportWriter::from_settings(&self.config.output).write(&report)?;
        Ok(RunSummary { report, path })
    }
}

fn checked_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput("URL cannot be empty".to_string()));
    }
    Ok(url)
}
