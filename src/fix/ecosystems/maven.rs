//! Maven support.
//!
//! Maven versions are often declared through a POM property
//! (`<version>${jackson.version}</version>`) rather than a literal, so the fix
//! first overrides the dependency itself and then rewrites every property
//! that feeds its version. The [`MavenPropertyIndex`] that records those
//! properties doubles as the list of direct dependencies: packages absent
//! from it are transitive and are not fixed.

use crate::fix::traits::{FixContext, FixError, PackageFixer};
use crate::model::PackageType;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Direct dependency coordinate (`groupId:artifactId`) → POM properties that
/// hold its version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenPropertyIndex {
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl MavenPropertyIndex {
    /// Records a direct dependency, optionally versioned through `property`.
    pub fn insert(&mut self, coordinate: impl Into<String>, property: Option<String>) {
        let properties = self.dependencies.entry(coordinate.into()).or_default();
        if let Some(property) = property {
            properties.insert(property);
        }
    }

    pub fn contains(&self, coordinate: &str) -> bool {
        self.dependencies.contains_key(coordinate)
    }

    pub fn properties(&self, coordinate: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(coordinate)
            .into_iter()
            .flat_map(|properties| properties.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

// ============================================================================
// Fixer
// ============================================================================

/// Upgrades Maven dependencies with the versions-maven-plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct MavenFixer;

#[async_trait]
impl PackageFixer for MavenFixer {
    fn package_type(&self) -> PackageType {
        PackageType::Maven
    }

    async fn apply_fix(&self, package: &str, version: &str, ctx: &FixContext<'_>) -> Result<(), FixError> {
        info!(package, version, "Running 'mvn versions:use-dep-version'");
        ctx.run(
            "mvn",
            vec![
                "-B".to_string(),
                "versions:use-dep-version".to_string(),
                format!("-Dincludes={}", package),
                format!("-DdepVersion={}", version),
                "-DforceVersion=true".to_string(),
                "-DgenerateBackupPoms=false".to_string(),
            ],
        )
        .await?;

        for property in ctx.maven_properties.properties(package) {
            info!(package, property, version, "Running 'mvn versions:set-property'");
            ctx.run(
                "mvn",
                vec![
                    "-B".to_string(),
                    "versions:set-property".to_string(),
                    format!("-Dproperty={}", property),
                    format!("-DnewVersion={}", version),
                    "-DgenerateBackupPoms=false".to_string(),
                ],
            )
            .await?;
        }
        Ok(())
    }
}

// ============================================================================
// Property Index
// ============================================================================

#[derive(Error, Debug)]
pub enum PropertyIndexError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid POM pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Manifest inspection producing the [`MavenPropertyIndex`] once per run.
pub trait PropertyIndexSource: Send + Sync {
    fn load(&self) -> Result<MavenPropertyIndex, PropertyIndexError>;
}

impl PropertyIndexSource for MavenPropertyIndex {
    fn load(&self) -> Result<MavenPropertyIndex, PropertyIndexError> {
        Ok(self.clone())
    }
}

/// Reads `pom.xml` under a project root, following `<modules>`.
#[derive(Debug, Clone)]
pub struct PomPropertyScanner {
    root: PathBuf,
}

struct PomPatterns {
    comment: Regex,
    build: Regex,
    dependency: Regex,
    group_id: Regex,
    artifact_id: Regex,
    version: Regex,
    property: Regex,
    module: Regex,
}

impl PomPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            comment: Regex::new(r"(?s)<!--.*?-->")?,
            build: Regex::new(r"(?s)<build>.*?</build>")?,
            dependency: Regex::new(r"(?s)<dependency>(.*?)</dependency>")?,
            group_id: Regex::new(r"<groupId>\s*([^<]+?)\s*</groupId>")?,
            artifact_id: Regex::new(r"<artifactId>\s*([^<]+?)\s*</artifactId>")?,
            version: Regex::new(r"<version>\s*([^<]+?)\s*</version>")?,
            property: Regex::new(r"^\$\{([^}]+)\}$")?,
            module: Regex::new(r"<module>\s*([^<]+?)\s*</module>")?,
        })
    }
}

impl PomPropertyScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn scan_pom(
        &self,
        patterns: &PomPatterns,
        pom: &Path,
        visited: &mut HashSet<PathBuf>,
        index: &mut MavenPropertyIndex,
    ) -> Result<(), PropertyIndexError> {
        if !visited.insert(pom.to_path_buf()) {
            return Ok(());
        }
        let raw = std::fs::read_to_string(pom).map_err(|source| PropertyIndexError::Io {
            path: pom.to_path_buf(),
            source,
        })?;
        let content = patterns.comment.replace_all(&raw, "");
        // Plugin dependencies are not project dependencies.
        let content = patterns.build.replace_all(&content, "");

        for block in patterns.dependency.captures_iter(&content) {
            let body = &block[1];
            let (Some(group), Some(artifact)) = (
                patterns.group_id.captures(body),
                patterns.artifact_id.captures(body),
            ) else {
                continue;
            };
            let property = patterns
                .version
                .captures(body)
                .and_then(|version| patterns.property.captures(&version[1]).map(|p| p[1].to_string()))
                .filter(|property| !property.starts_with("project."));
            index.insert(format!("{}:{}", &group[1], &artifact[1]), property);
        }

        let base = pom.parent().unwrap_or(Path::new("."));
        for module in patterns.module.captures_iter(&content) {
            let module_path = base.join(&module[1]);
            let module_pom = if module_path.extension().is_some_and(|ext| ext == "xml") {
                module_path
            } else {
                module_path.join("pom.xml")
            };
            debug!(pom = %module_pom.display(), "Scanning Maven module");
            self.scan_pom(patterns, &module_pom, visited, index)?;
        }
        Ok(())
    }
}

impl PropertyIndexSource for PomPropertyScanner {
    fn load(&self) -> Result<MavenPropertyIndex, PropertyIndexError> {
        let patterns = PomPatterns::compile()?;
        let mut index = MavenPropertyIndex::default();
        let mut visited = HashSet::new();
        self.scan_pom(&patterns, &self.root.join("pom.xml"), &mut visited, &mut index)?;
        info!(dependencies = index.len(), "Indexed direct Maven dependencies");
        Ok(index)
    }
}
