pub mod config;
pub mod executor;
pub mod fix;
pub mod git;
pub mod github;
pub mod model;
pub mod scan;
pub mod traits;
pub mod usage;

// Re-export common types for convenience
pub use config::*;
pub use executor::*;
pub use github::GitHubClient;
pub use model::*;
pub use scan::ReportFileScanner;
pub use traits::*;
pub use usage::LogUsageReporter;
