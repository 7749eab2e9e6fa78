use crate::fix::traits::{FixContext, FixError, PackageFixer};
use crate::model::PackageType;
use async_trait::async_trait;
use tracing::info;

/// Upgrades Go modules with `go get`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoFixer;

#[async_trait]
impl PackageFixer for GoFixer {
    fn package_type(&self) -> PackageType {
        PackageType::Go
    }

    async fn apply_fix(&self, package: &str, version: &str, ctx: &FixContext<'_>) -> Result<(), FixError> {
        let target = format!("{}@v{}", package, version);
        info!("Running 'go get {}'", target);
        ctx.run("go", vec!["get".to_string(), target]).await
    }
}
