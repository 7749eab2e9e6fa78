use crate::traits::UsageReporter;
use async_trait::async_trait;
use tracing::debug;

/// Records usage as a tracing event instead of sending it anywhere.
#[derive(Debug, Clone, Default)]
pub struct LogUsageReporter;

#[async_trait]
impl UsageReporter for LogUsageReporter {
    async fn report_usage(&self, command: &str) {
        debug!(command, version = env!("CARGO_PKG_VERSION"), "Usage report");
    }
}
