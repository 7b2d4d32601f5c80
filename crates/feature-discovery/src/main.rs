//! # feature-discovery
//!
//! Discovers interactive features (buttons, inputs, navigation, composite
//! components) on a web page, synthesizes test cases for them, runs the tests
//! and writes a JSON report.
//!
//! ## Usage
//!
//! ```text
//! feature-discovery http://localhost:3000 --backend cdp --output ./reports
//! feature-discovery http://localhost/ --backend static --fixture site.yaml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use feature_discovery::FeatureDiscoveryOrchestrator;
use feature_discovery_core::{DiscoveryConfig, DiscoveryReport};

#[derive(Debug, Parser)]
#[command(name = "feature-discovery", version, about)]
struct Cli {
    /// Page to analyze
    #[arg(required_unless_present = "print_schema")]
    url: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "FEATURE_DISCOVERY_CONFIG")]
    config: Option<PathBuf>,

    /// Automation backend: static, cdp or webdriver
    #[arg(short, long)]
    backend: Option<String>,

    /// Site fixture for the static backend
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Report directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip test synthesis and execution
    #[arg(long)]
    no_tests: bool,

    /// Synthesize tests without running them
    #[arg(long)]
    no_execute: bool,

    /// Embed a page screenshot in the report
    #[arg(long)]
    screenshot: bool,

    /// Print the report JSON schema and exit
    #[arg(long)]
    print_schema: bool,
}

impl Cli {
    /// Load the configuration file, if any, and apply flag overrides.
    fn load_config(&self) -> anyhow::Result<DiscoveryConfig> {
        let mut config = match &self.config {
            Some(path) => DiscoveryConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DiscoveryConfig::default(),
        };
        if let Some(backend) = &self.backend {
            config.driver.backend = backend.clone();
        }
        if let Some(fixture) = &self.fixture {
            config.driver.fixture_path = Some(fixture.clone());
        }
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if self.no_tests {
            config.execution.generate_tests = false;
            config.execution.execute_tests = false;
        }
        if self.no_execute {
            config.execution.execute_tests = false;
        }
        if self.screenshot {
            config.output.capture_screenshot = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_schema {
        let schema = schemars::schema_for!(DiscoveryReport);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = cli.load_config()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let url = cli.url.as_deref().unwrap_or_default();
    let orchestrator = FeatureDiscoveryOrchestrator::new(config)?;
    tracing::info!(
        "feature-discovery v{} starting ({} backend)",
        env!("CARGO_PKG_VERSION"),
        orchestrator.backend()
    );

    let summary = orchestrator.run(url).await.map_err(|e| {
        tracing::error!("Run failed: {}", e);
        e
    })?;

    let report = &summary.report;
    println!(
        "{} features, {} test cases, {} failed",
        report.features_discovered(),
        report.test_cases().len(),
        report.failed_tests()
    );
    println!("Report: {}", summary.path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "feature-discovery",
            "http://localhost/",
            "--backend",
            "static",
            "--fixture",
            "site.yaml",
            "--output",
            "out",
            "--no-execute",
            "--screenshot",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.driver.backend, "static");
        assert_eq!(config.driver.fixture_path, Some(PathBuf::from("site.yaml")));
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert!(config.execution.generate_tests);
        assert!(!config.execution.execute_tests);
        assert!(config.output.capture_screenshot);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_tests_disables_execution() {
        let cli = Cli::parse_from(["feature-discovery", "http://localhost/", "--no-tests"]);
        let config = cli.load_config().unwrap();
        assert!(!config.execution.generate_tests);
        assert!(!config.execution.execute_tests);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_required_unless_printing_schema() {
        assert!(Cli::try_parse_from(["feature-discovery"]).is_err());
        assert!(Cli::try_parse_from(["feature-discovery", "--print-schema"]).is_ok());
    }
}
