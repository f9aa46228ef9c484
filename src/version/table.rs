//! Supported upgrade paths

use super::error::VersionError;
use super::parse_version;
use semver::Version;

/// A supported `(source major, target major)` pair with the lowest versions
/// accepted on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradePath {
    pub source_major: u64,
    pub target_major: u64,
    pub min_source: &'static str,
    pub min_target: &'static str,
}

pub const UPGRADE_PATHS: &[UpgradePath] = &[
    UpgradePath {
        source_major: 5,
        target_major: 6,
        min_source: "5.29.10",
        min_target: "6.24.0",
    },
    UpgradePath {
        source_major: 6,
        target_major: 6,
        min_source: "6.24.0",
        min_target: "6.24.0",
    },
    UpgradePath {
        source_major: 6,
        target_major: 7,
        min_source: "6.24.0",
        min_target: "7.0.0",
    },
    UpgradePath {
        source_major: 7,
        target_major: 7,
        min_source: "7.0.0",
        min_target: "7.0.0",
    },
];

/// Half-open range `[min, upper)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Version,
    pub upper: Version,
}

impl VersionRange {
    /// `[min, (min.major + 1).0.0)`
    pub fn within_major(min: Version) -> Self {
        let upper = Version::new(min.major + 1, 0, 0);
        Self { min, upper }
    }

    pub fn contains(&self, version: &Version) -> bool {
        *version >= self.min && *version < self.upper
    }
}

impl UpgradePath {
    pub fn find(source_major: u64, target_major: u64) -> Option<&'static UpgradePath> {
        UPGRADE_PATHS
            .iter()
            .find(|path| path.source_major == source_major && path.target_major == target_major)
    }

    pub fn source_range(&self) -> Result<VersionRange, VersionError> {
        parse_version(self.min_source).map(VersionRange::within_major)
    }

    pub fn target_range(&self) -> Result<VersionRange, VersionError> {
        parse_version(self.min_target).map(VersionRange::within_major)
    }
}

/// "5 to 6, 6 to 6, 6 to 7, and 7 to 7"
pub fn supported_pairs() -> String {
    let pairs: Vec<String> = UPGRADE_PATHS
        .iter()
        .map(|path| format!("{} to {}", path.source_major, path.target_major))
        .collect();

    match pairs.split_last() {
        None => String::new(),
        Some((only, [])) => only.clone(),
        Some((last, rest)) => format!("{}, and {}", rest.join(", "), last),
    }
}
