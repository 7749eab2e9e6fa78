//! Ecosystem-specific implementations of
//! [`PackageFixer`](crate::fix::PackageFixer) and the registry that picks one
//! per package type.

pub mod go;
pub mod maven;
pub mod npm;

use crate::fix::traits::{FixError, PackageFixer};
use crate::model::PackageType;
use std::collections::HashMap;

pub use go::GoFixer;
pub use maven::{MavenFixer, MavenPropertyIndex, PomPropertyScanner, PropertyIndexError, PropertyIndexSource};
pub use npm::NpmFixer;

/// Lookup table from package type to fixer.
pub struct FixerRegistry {
    fixers: HashMap<PackageType, Box<dyn PackageFixer>>,
}

impl FixerRegistry {
    pub fn empty() -> Self {
        Self {
            fixers: HashMap::new(),
        }
    }

    /// Registers `fixer` under its package type, replacing any previous one.
    pub fn with_fixer(mut self, fixer: Box<dyn PackageFixer>) -> Self {
        self.fixers.insert(fixer.package_type(), fixer);
        self
    }

    /// Returns the fixer for `package_type`.
    ///
    /// # Errors
    ///
    /// [`FixError::UnsupportedPackageType`] when nothing is registered for it.
    pub fn resolve(&self, package_type: &PackageType) -> Result<&dyn PackageFixer, FixError> {
        self.fixers
            .get(package_type)
            .map(|fixer| fixer.as_ref())
            .ok_or_else(|| FixError::UnsupportedPackageType(package_type.clone()))
    }
}

impl Default for FixerRegistry {
    /// Go, npm and Maven.
    fn default() -> Self {
        Self::empty()
            .with_fixer(Box::new(GoFixer))
            .with_fixer(Box::new(NpmFixer))
            .with_fixer(Box::new(MavenFixer))
    }
}
