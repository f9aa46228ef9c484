//! Common test utilities and helpers

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated environment for running the `upgrade-hub` binary
pub struct HubEnv {
    temp_dir: TempDir,
}

impl HubEnv {
    /// Starts with an empty `hub.toml`, so every setting has its default
    pub fn new() -> Self {
        let env = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        env.write_config("");
        env
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn log_dir(&self) -> PathBuf {
        self.path().join("logs")
    }

    pub fn log_contents(&self) -> String {
        fs::read_to_string(self.log_dir().join("hub.log")).unwrap_or_default()
    }

    /// Command with config and log locations pointed inside the temp dir
    pub fn hub(&self) -> Command {
        let mut cmd = Command::cargo_bin("upgrade-hub").unwrap();
        cmd.arg("--config")
            .arg(self.path().join("hub.toml"))
            .env("UPGRADE_HUB_LOG_DIR", self.log_dir())
            .env_remove("UPGRADE_HUB_LOG_LEVEL");
        cmd
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.path().join("hub.toml"), contents).unwrap();
    }

    /// Create an installation whose server binary reports `version`
    #[cfg(unix)]
    pub fn install(&self, name: &str, version: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let home = self.path().join(name);
        let bin = home.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = bin.join("postgres");
        fs::write(
            &script,
            format!("#!/bin/sh\necho \"postgres (Cluster Database) {version} build test\"\n"),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        home
    }
}
