use fixbot::fix::FixPipeline;
use fixbot::{FixConfig, GitHubClient, LogUsageReporter, ProcessExecutor, ReportFileScanner};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match FixConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let report_path = config
        .scan_report
        .clone()
        .unwrap_or_else(|| config.working_dir.join("scan-report.json"));
    let pipeline = FixPipeline::new(
        config.clone(),
        Arc::new(ReportFileScanner::new(report_path)),
        Arc::new(GitHubClient::new(config.api_url.clone(), config.token.clone())),
        Arc::new(ProcessExecutor::new()),
    )
    .with_usage_reporter(Arc::new(LogUsageReporter));

    match pipeline.run().await {
        Ok(summary) => {
            info!(
                opened = summary.opened.len(),
                already_fixed = summary.already_fixed.len(),
                failed = summary.failed.len(),
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Fix run failed");
            ExitCode::FAILURE
        }
    }
}
