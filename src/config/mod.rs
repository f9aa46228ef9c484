//! Hub configuration
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual values.

use crate::error::{Error, Result};
use crate::stream::scanner::DEFAULT_MAX_LINE_BYTES;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_LOG_LEVEL: &str = "UPGRADE_HUB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "UPGRADE_HUB_LOG_DIR";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "upgrade-hub", "upgrade-hub")
}

/// Default location for the durable hub log
pub fn default_log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("logs"))
}

/// Config file read when no `--config` is given
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("hub.toml"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub log: LogConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive for the durable log
    pub level: String,
    /// Directory holding the durable log file; no file is written when unset
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Longest line the log mirror will scan before failing the write
    pub max_line_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`, which must exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "config file {} not found",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `path`, falling back to defaults when no file exists there
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream.max_line_bytes == 0 {
            return Err(Error::Config(
                "stream.max_line_bytes must be greater than zero".to_string(),
            ));
        }
        if self.log.level.trim().is_empty() {
            return Err(Error::Config("log.level must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log.level = level;
        }

        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.log.dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HubConfig::new();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.stream.max_line_bytes, 64 * 1024);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = HubConfig::from_toml(
            r#"
[log]
level = "debug"
dir = "/tmp/hub-logs"
"#,
        )
        .unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.dir, Some(PathBuf::from("/tmp/hub-logs")));
        assert_eq!(config.stream, StreamConfig::default());
    }

    #[test]
    fn test_rejects_zero_line_limit() {
        let err = HubConfig::from_toml("[stream]\nmax_line_bytes = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_line_bytes"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            HubConfig::from_toml("[log\nlevel = 3"),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_load_or_default_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = HubConfig::load_or_default(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, HubConfig::default());
    }

    #[test]
    fn test_load_requires_the_file() {
        let temp = TempDir::new().unwrap();
        let err = HubConfig::load(&temp.path().join("typo.toml")).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("typo.toml"));
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hub.toml");
        std::fs::write(&path, "").unwrap();

        assert_eq!(HubConfig::load(&path).unwrap(), HubConfig::default());
    }

    #[test]
    fn test_load_reports_path_on_bad_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hub.toml");
        std::fs::write(&path, "[stream]\nmax_line_bytes = 0\n").unwrap();

        let err = HubConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("hub.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(ENV_LOG_LEVEL, "trace"), (ENV_LOG_DIR, "/var/log/hub")]);
        let mut config = HubConfig::new();

        config.merge_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.log.level, "trace");
        assert_eq!(config.log.dir, Some(PathBuf::from("/var/log/hub")));
    }

    #[test]
    fn test_empty_log_dir_disables_file_log() {
        let mut config = HubConfig::new();
        config.merge_vars(|key| (key == ENV_LOG_DIR).then(String::new));
        assert_eq!(config.log.dir, None);
    }
}
