//! Common test utilities for tsd-s3cmd integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// An isolated environment: a private PATH directory and config home
pub struct TestEnv {
    /// Temporary directory
    pub temp: TempDir,
    /// Directory placed on PATH for the command under test
    pub bin: PathBuf,
    /// Directory used as HOME and XDG_CONFIG_HOME
    pub home: PathBuf,
}

impl TestEnv {
    /// Create a new empty test environment
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let bin = temp.path().join("bin");
        let home = temp.path().join("home");
        std::fs::create_dir_all(&bin).expect("Failed to create bin directory");
        std::fs::create_dir_all(&home).expect("Failed to create home directory");
        Self { temp, bin, home }
    }

    /// Write an executable shell script into the PATH directory
    #[cfg(unix)]
    pub fn write_program(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.bin.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write program");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make program executable");
        path
    }

    /// Write a file relative to the temp root
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.temp.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Write the default-location config file
    pub fn write_config(&self, content: &str) -> PathBuf {
        let dir = self.home.join("tsd-s3cmd");
        std::fs::create_dir_all(&dir).expect("Failed to create config directory");
        let path = dir.join("config.yaml");
        std::fs::write(&path, content).expect("Failed to write config");
        path
    }

    /// Command for a built binary, with PATH, HOME and overrides isolated
    pub fn cmd(&self, bin: &str) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin(bin).expect("binary should be built");
        cmd.env("PATH", &self.bin)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", &self.home)
            .env_remove("TSD_S3CMD_CONFIG")
            .env_remove("TSD_S3CMD_LOG")
            .env_remove("TSD_S3CMD_S3CMD")
            .env_remove("TSD_S3CMD_TACL");
        cmd
    }

    pub fn tsd_s3cmd(&self) -> Command {
        self.cmd("tsd-s3cmd")
    }

    pub fn tacl_auth(&self) -> Command {
        self.cmd("tacl_auth")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
