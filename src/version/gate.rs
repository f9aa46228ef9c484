//! The upgrade version gate

use super::error::{ClusterRole, VersionError};
use super::probe::{BinaryVersionProbe, VersionProbe};
use super::table::UpgradePath;
use semver::Version;
use std::path::Path;

/// Check that upgrading from `source` to `target` is supported.
///
/// Pure: consults only the upgrade path table.
pub fn validate(source: &Version, target: &Version) -> Result<(), VersionError> {
    let path = UpgradePath::find(source.major, target.major).ok_or_else(|| {
        VersionError::UnsupportedPair {
            source_version: source.clone(),
            target_version: target.clone(),
        }
    })?;

    let source_range = path.source_range()?;
    if !source_range.contains(source) {
        return Err(VersionError::SourceOutOfRange {
            version: source.clone(),
            minimum: source_range.min,
        });
    }

    let target_range = path.target_range()?;
    if !target_range.contains(target) {
        return Err(VersionError::TargetOutOfRange {
            version: target.clone(),
            minimum: target_range.min,
        });
    }

    Ok(())
}

/// Versions found for a verified upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedVersions {
    pub source: Version,
    pub target: Version,
}

/// Resolves installations to versions and runs them through [`validate`]
pub struct VersionGate {
    source_probe: Box<dyn VersionProbe>,
    target_probe: Box<dyn VersionProbe>,
}

impl VersionGate {
    pub fn new(
        source_probe: impl VersionProbe + 'static,
        target_probe: impl VersionProbe + 'static,
    ) -> Self {
        Self {
            source_probe: Box::new(source_probe),
            target_probe: Box::new(target_probe),
        }
    }

    /// Gate that asks each installation's server binary for its version
    pub fn production() -> Self {
        Self::new(BinaryVersionProbe::default(), BinaryVersionProbe::default())
    }

    pub fn verify(
        &self,
        source_home: &Path,
        target_home: &Path,
    ) -> Result<VerifiedVersions, VersionError> {
        let source = discover(&*self.source_probe, ClusterRole::Source, source_home)?;
        let target = discover(&*self.target_probe, ClusterRole::Target, target_home)?;

        tracing::info!("Verifying upgrade from {} to {}", source, target);
        validate(&source, &target)?;

        Ok(VerifiedVersions { source, target })
    }
}

fn discover(
    probe: &dyn VersionProbe,
    role: ClusterRole,
    home: &Path,
) -> Result<Version, VersionError> {
    probe
        .version(home)
        .map_err(|e| VersionError::Discovery {
            role,
            home: home.to_path_buf(),
            reason: format!("{e:#}"),
        })
}
