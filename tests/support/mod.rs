#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};

use assert_cmd::Command;
use tempfile::TempDir;

use taskboard::storage::BoardStorage;
use taskboard::storage::FileStore;
use taskboard::user::{mock_users, User};

/// Scratch data directory for a board
pub struct TestBoardDir {
    dir: TempDir,
}

impl TestBoardDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("taskboard.toml");
        fs::write(&path, contents).expect("write config");
        path
    }

    pub fn storage(&self) -> BoardStorage<FileStore> {
        BoardStorage::open(self.path()).expect("open storage")
    }

    /// `taskboard` invocation pinned to this data directory
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskboard").expect("binary");
        cmd.env_remove("TASKBOARD_DIR")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.path());
        cmd
    }

    /// Start a long-running `taskboard` (e.g. `watch`) in the background
    pub fn spawn(&self, args: &[&str]) -> Child {
        std::process::Command::new(env!("CARGO_BIN_EXE_taskboard"))
            .env_remove("TASKBOARD_DIR")
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.path())
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn taskboard")
    }

    /// Run a command with `--json` and parse the envelope
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().arg("--json").args(args).output().expect("run");
        serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
            panic!(
                "invalid json from {args:?}: {err}\nstdout: {}\nstderr: {}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
        })
    }

    pub fn login(&self, email: &str) {
        self.cmd()
            .args(["login", email, "--password", "secret"])
            .assert()
            .success();
    }
}

pub fn alice() -> User {
    mock_users().remove(0)
}

pub fn bob() -> User {
    mock_users().remove(1)
}
