//! Folds impacted vulnerabilities into one fix decision per package.

use crate::fix::ecosystems::MavenPropertyIndex;
use crate::fix::version::{compare_versions, parse_fix_version};
use crate::model::{FixVersionInfo, FixVersionsMap, ImpactedVulnerability, PackageType};
use std::cmp::Ordering;
use tracing::debug;

impl FixVersionInfo {
    pub fn new(fix_version: impl Into<String>, package_type: PackageType) -> Self {
        Self {
            fix_version: fix_version.into(),
            package_type,
        }
    }

    /// Lowers the fix version to `candidate` when it is strictly older.
    pub fn update_fix_version(&mut self, candidate: &str) {
        if self.fix_version.is_empty() || compare_versions(candidate, &self.fix_version) == Ordering::Less {
            self.fix_version = candidate.to_string();
        }
    }
}

/// Ecosystem-specific rule deciding whether a vulnerable package is fixed.
pub struct FixFilter<'a> {
    maven_properties: &'a MavenPropertyIndex,
}

impl<'a> FixFilter<'a> {
    pub fn new(maven_properties: &'a MavenPropertyIndex) -> Self {
        Self { maven_properties }
    }

    /// Maven packages are fixed only when declared directly in a POM.
    pub fn should_fix(&self, vulnerability: &ImpactedVulnerability) -> bool {
        match vulnerability.impacted_package_type {
            PackageType::Maven => self
                .maven_properties
                .contains(&vulnerability.impacted_package_name),
            _ => true,
        }
    }
}

/// Builds the fix map, keeping for each package the lowest version that
/// resolves every vulnerability naming it.
///
/// Only the first fixed-version range of a vulnerability is used. Ranges
/// without a closed lower bound never create or lower an entry.
pub fn aggregate(vulnerabilities: &[ImpactedVulnerability], filter: &FixFilter<'_>) -> FixVersionsMap {
    let mut fix_versions = FixVersionsMap::new();
    for vulnerability in vulnerabilities {
        let Some(range) = vulnerability.fixed_versions.first() else {
            continue;
        };
        if !filter.should_fix(vulnerability) {
            debug!(
                package = %vulnerability.impacted_package_name,
                issue = %vulnerability.issue_id,
                "Skipping indirect dependency"
            );
            continue;
        }
        let Some(fix_version) = parse_fix_version(range) else {
            debug!(
                package = %vulnerability.impacted_package_name,
                range = %range,
                "No closed lower bound in fix range"
            );
            continue;
        };
        fix_versions
            .entry(vulnerability.impacted_package_name.clone())
            .and_modify(|info| info.update_fix_version(&fix_version))
            .or_insert_with(|| FixVersionInfo::new(fix_version.clone(), vulnerability.impacted_package_type.clone()));
    }
    fix_versions
}
