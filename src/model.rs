use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Output of one scan of the repository's dependency manifests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Policy violation. Not acted upon by the fixer.
    Violation(Issue),
    Vulnerability(Issue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub issue_id: String, // XRAY-1234, CVE-2023-XXXX
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub summary: String,
    /// Keyed by component id, e.g. `go://github.com/gin-gonic/gin:1.6.0`.
    pub components: BTreeMap<String, ComponentFix>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentFix {
    /// Version ranges in interval notation, in the feed's order of preference.
    #[serde(default)]
    pub fixed_versions: Vec<String>,
}

/// The dependency-management system a package belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageType {
    Go,
    Npm,
    Maven,
    Other(String),
}

impl PackageType {
    /// Maps a component-id scheme (`go`, `npm`, `gav`) to its ecosystem.
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme {
            "go" => PackageType::Go,
            "npm" => PackageType::Npm,
            "gav" => PackageType::Maven,
            other => PackageType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PackageType::Go => "Go",
            PackageType::Npm => "npm",
            PackageType::Maven => "Maven",
            PackageType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PackageType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Go" => PackageType::Go,
            "npm" => PackageType::Npm,
            "Maven" => PackageType::Maven,
            _ => PackageType::Other(tag),
        }
    }
}

impl From<PackageType> for String {
    fn from(package_type: PackageType) -> Self {
        package_type.as_str().to_string()
    }
}

/// A vulnerability narrowed down to a single impacted package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactedVulnerability {
    pub issue_id: String,
    pub severity: String,
    pub impacted_package_name: String,
    pub impacted_package_version: String,
    pub impacted_package_type: PackageType,
    pub fixed_versions: Vec<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("component id '{component}' of {issue_id} has no ecosystem scheme")]
    MissingScheme { issue_id: String, component: String },
    #[error("component id '{component}' of {issue_id} has no version")]
    MissingVersion { issue_id: String, component: String },
}

impl ScanReport {
    /// Flattens every vulnerability finding into one entry per impacted
    /// component. Violations are skipped.
    pub fn impacted_vulnerabilities(&self) -> Result<Vec<ImpactedVulnerability>, NormalizationError> {
        let mut impacted = Vec::new();
        for finding in &self.findings {
            let Finding::Vulnerability(issue) = finding else {
                continue;
            };
            for (component, fix) in &issue.components {
                let (package_type, name, version) = split_component_id(&issue.issue_id, component)?;
                impacted.push(ImpactedVulnerability {
                    issue_id: issue.issue_id.clone(),
                    severity: issue.severity.clone(),
                    impacted_package_name: name.to_string(),
                    impacted_package_version: version.to_string(),
                    impacted_package_type: package_type,
                    fixed_versions: fix.fixed_versions.clone(),
                });
            }
        }
        Ok(impacted)
    }
}

fn split_component_id<'a>(
    issue_id: &str,
    component: &'a str,
) -> Result<(PackageType, &'a str, &'a str), NormalizationError> {
    let (scheme, coordinate) = component
        .split_once("://")
        .ok_or_else(|| NormalizationError::MissingScheme {
            issue_id: issue_id.to_string(),
            component: component.to_string(),
        })?;
    match coordinate.rsplit_once(':') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok((PackageType::from_scheme(scheme), name, version))
        }
        _ => Err(NormalizationError::MissingVersion {
            issue_id: issue_id.to_string(),
            component: component.to_string(),
        }),
    }
}

/// Fix decision for one impacted package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixVersionInfo {
    pub fix_version: String,
    pub package_type: PackageType,
}

/// Impacted package name → fix decision.
pub type FixVersionsMap = BTreeMap<String, FixVersionInfo>;
