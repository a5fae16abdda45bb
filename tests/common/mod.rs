#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

/// Scratch directory with its own sheet store, cleaned up on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.temp_dir.path().join("tracker.json")
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// The binary, pointed at this workspace's store and run inside it.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tracker-sheet").expect("binary exists");
        cmd.current_dir(self.path())
            .env("RUST_LOG", "warn")
            .arg("--store")
            .arg(self.store_path());
        cmd
    }

    /// Runs the binary and returns trimmed stdout, panicking on failure.
    pub fn run(&self, args: &[&str]) -> String {
        let output = self.command().args(args).output().expect("run binary");
        assert!(
            output.status.success(),
            "command {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("utf-8 stdout")
            .trim()
            .to_string()
    }
}

pub const LEDGER_CSV: &str = "Ad,Tutar,Durum\nAli,100,Odendi\nAyse,250,Odenmedi\n";
