use super::table::supported_pairs;
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of an upgrade a cluster is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterRole {
    Source,
    Target,
}

impl fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterRole::Source => f.write_str("source"),
            ClusterRole::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid version {input:?}: {reason}")]
    Parse {
        input: String,
        #[source]
        reason: semver::Error,
    },

    #[error(
        "Unsupported source and target versions. Found source version {source_version} and target version {target_version}. Upgrade is only supported for {}. Check the documentation for further information.",
        supported_pairs()
    )]
    UnsupportedPair {
        source_version: Version,
        target_version: Version,
    },

    #[error(
        "Source cluster version {version} is not supported. The minimum required version is {minimum}. We recommend the latest version."
    )]
    SourceOutOfRange { version: Version, minimum: Version },

    #[error(
        "Target cluster version {version} is not supported. The minimum required version is {minimum}. We recommend the latest version."
    )]
    TargetOutOfRange { version: Version, minimum: Version },

    #[error("could not determine {role} cluster version from {}: {reason}", home.display())]
    Discovery {
        role: ClusterRole,
        home: PathBuf,
        reason: String,
    },
}
