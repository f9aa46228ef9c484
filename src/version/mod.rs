//! Version compatibility checks
//!
//! Before any step runs, the source and target installations must form one
//! of the supported upgrade paths in [`UPGRADE_PATHS`], and each side must be
//! at or above that path's minimum version within its major release.

pub mod error;
pub mod gate;
pub mod probe;
pub mod table;


pub use error::{ClusterRole, VersionError};
pub use gate::{validate, VerifiedVersions, VersionGate};
pub use probe::{parse_version_output, BinaryVersionProbe, VersionProbe};
pub use table::{UpgradePath, VersionRange, UPGRADE_PATHS};

use semver::Version;

/// Parse a dotted `major.minor.patch` version string
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    Version::parse(input.trim()).map_err(|reason| VersionError::Parse {
        input: input.to_string(),
        reason,
    })
}
