//! Report persistence.

use std::path::{Path, PathBuf};

use feature_discovery_core::{DiscoveryReport, OutputSettings, Result};

/// Writes reports as `report-<timestamp>.json` into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    directory: PathBuf,
    pretty: bool,
}

impl ReportWriter {
    /// Writer into `directory`, pretty-printing by default.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            pretty: true,
        }
    }

    /// Writer configured from output settings.
    pub fn from_settings(settings: &OutputSettings) -> Self {
        Self::new(settings.directory.clone()).pretty(settings.pretty)
    }

    /// Pretty-print or emit compact JSON.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Output directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name for `report`; timestamp punctuation becomes `-`.
    pub fn file_name(report: &DiscoveryReport) -> String {
        let stamp: String = report
            .timestamp()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("report-{stamp}.json")
    }

    /// Serialize `report` and write it, creating the directory if needed.
    pub fn write(&self, report: &DiscoveryReport) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        let path = self.directory.join(Self::file_name(report));
        std::fs::write(&path, json)?;
        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }

    /// Read a persisted report back.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DiscoveryReport> {
        let json = std::fs::read_to_string(path)?;
        DiscoveryReport::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_portable() {
        let report = DiscoveryReport::assemble_at(
            "2024-01-15T12:30:00.5+00:00",
            "http://x/",
            vec![],
            vec![],
        );
        assert_eq!(
            ReportWriter::file_name(&report),
            "report-2024-01-15T12-30-00-5-00-00.json"
        );
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("nested")).pretty(false);
        let report = DiscoveryReport::assemble("http://x/", vec![], vec![]).with_backend("static");

        let path = writer.write(&report).unwrap();
        let loaded = ReportWriter::load(&path).unwrap();
        assert_eq!(loaded.features_discovered(), 0);
        assert_eq!(loaded.backend(), Some("static"));
        assert!(!std::fs::read_to_string(&path).unwrap().contains('\n'));
    }
}
