//! Version discovery for installed clusters

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Command;

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?")
        .expect("Valid regex pattern")
});

/// Resolves an installation directory to the version installed there.
///
/// Any `Fn(&Path) -> Result<Version>` closure is a probe, which keeps test
/// doubles to a one-liner.
pub trait VersionProbe: Send + Sync {
    fn version(&self, home: &Path) -> Result<Version>;
}

impl<F> VersionProbe for F
where
    F: Fn(&Path) -> Result<Version> + Send + Sync,
{
    fn version(&self, home: &Path) -> Result<Version> {
        self(home)
    }
}

/// Asks the server binary inside an installation for its version
#[derive(Debug, Clone)]
pub struct BinaryVersionProbe {
    binary: PathBuf,
    args: Vec<String>,
}

impl BinaryVersionProbe {
    /// `binary` is resolved relative to the installation directory
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: vec!["--version".to_string()],
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }
}

impl Default for BinaryVersionProbe {
    fn default() -> Self {
        Self::new(Path::new("bin").join("postgres"))
    }
}

impl VersionProbe for BinaryVersionProbe {
    fn version(&self, home: &Path) -> Result<Version> {
        let program = home.join(&self.binary);
        tracing::debug!("Probing version: {} {}", program.display(), self.args.join(" "));

        let output = Command::new(&program)
            .args(&self.args)
            .output()
            .with_context(|| format!("failed to execute {}", program.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_version_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract the first version found in a version banner such as
/// `postgres (Cluster Database) 6.24.3 build commit:abc`.
///
/// A pre-release suffix (`7.0.0-beta.1`) is kept, so a discovered version
/// orders the same way as one given on the command line.
pub fn parse_version_output(output: &str) -> Result<Version> {
    let found = VERSION_REGEX
        .find(output)
        .ok_or_else(|| anyhow!("no version found in {:?}", output.trim()))?;

    Version::parse(found.as_str())
        .with_context(|| format!("invalid version {:?} in {:?}", found.as_str(), output.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_banner() {
        let version =
            parse_version_output("postgres (Cluster Database) 6.24.3 build commit:0a1b2c\n")
                .unwrap();
        assert_eq!(version, Version::new(6, 24, 3));
    }

    #[test]
    fn test_parse_takes_first_match() {
        let version = parse_version_output("7.0.0 based on 12.12.0").unwrap();
        assert_eq!(version, Version::new(7, 0, 0));
    }

    #[test]
    fn test_parse_keeps_prerelease() {
        let version =
            parse_version_output("postgres (Cluster Database) 7.0.0-beta.1 build dev").unwrap();
        assert_eq!(version, Version::parse("7.0.0-beta.1").unwrap());
        assert!(version < Version::new(7, 0, 0));
    }

    #[test]
    fn test_parse_stops_before_sentence_punctuation() {
        let version = parse_version_output("Installed 6.24.3-rc.2.").unwrap();
        assert_eq!(version, Version::parse("6.24.3-rc.2").unwrap());
    }

    #[test]
    fn test_parse_rejects_out_of_range_component() {
        let err = parse_version_output("99999999999999999999.0.0").unwrap_err();
        assert!(err.to_string().contains("invalid version"));
    }

    #[test]
    fn test_parse_without_version_fails() {
        let err = parse_version_output("postgres (dev build)").unwrap_err();
        assert!(err.to_string().contains("no version found"));
    }

    #[test]
    fn test_closure_is_a_probe() {
        let probe = |_: &Path| -> Result<Version> { Ok(Version::new(5, 29, 10)) };
        assert_eq!(
            probe.version(Path::new("/unused")).unwrap(),
            Version::new(5, 29, 10)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_binary_probe_runs_installed_binary() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempfile::TempDir::new().unwrap();
        let bin = home.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let script = bin.join("postgres");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"postgres (Cluster Database) 6.25.1 build dev\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let version = BinaryVersionProbe::default().version(home.path()).unwrap();
        assert_eq!(version, Version::new(6, 25, 1));
    }

    #[test]
    fn test_binary_probe_missing_binary() {
        let home = tempfile::TempDir::new().unwrap();
        let err = BinaryVersionProbe::default()
            .version(home.path())
            .unwrap_err();
        assert!(err.to_string().contains("failed to execute"));
    }
}
