use crate::model::ScanReport;
use crate::traits::{ScanError, Scanner};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Reads a scan report previously written as JSON by the scanning service.
#[derive(Debug, Clone)]
pub struct ReportFileScanner {
    path: PathBuf,
}

impl ReportFileScanner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Scanner for ReportFileScanner {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn scan(&self) -> Result<ScanReport, ScanError> {
        let raw = tokio::fs::read(&self.path).await?;
        let report: ScanReport = serde_json::from_slice(&raw)?;
        info!(findings = report.findings.len(), "Loaded scan report");
        Ok(report)
    }
}
