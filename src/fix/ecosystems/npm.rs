use crate::fix::traits::{FixContext, FixError, PackageFixer};
use crate::model::PackageType;
use async_trait::async_trait;
use tracing::info;

/// Upgrades npm packages with `npm install`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmFixer;

#[async_trait]
impl PackageFixer for NpmFixer {
    fn package_type(&self) -> PackageType {
        PackageType::Npm
    }

    async fn apply_fix(&self, package: &str, version: &str, ctx: &FixContext<'_>) -> Result<(), FixError> {
        let target = format!("{}@{}", package, version);
        info!("Running 'npm install {}'", target);
        ctx.run("npm", vec!["install".to_string(), target]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::ecosystems::MavenPropertyIndex;
    use crate::fix::testing::ScriptedRunner;
    use std::path::Path;

    #[tokio::test]
    async fn test_npm_install_scoped_package() {
        let runner = ScriptedRunner::new("main");
        let index = MavenPropertyIndex::default();
        let ctx = FixContext {
            working_dir: Path::new("/repo"),
            runner: &runner,
            maven_properties: &index,
        };

        NpmFixer.apply_fix("@babel/traverse", "7.23.2", &ctx).await.unwrap();
        assert_eq!(runner.calls(), vec!["npm install @babel/traverse@7.23.2"]);
    }
}
