//! Helpers for driving the `opskit` binary against scratch directories.
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

/// A throwaway HOME with its own opskit.json and global git config.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn home(&self) -> PathBuf {
        let home = self.path().join("home");
        fs::create_dir_all(&home).unwrap();
        home
    }

    /// Write `~/.config/opskit/opskit.json` with the given `defaults` section.
    pub fn write_config(&self, defaults: Value) {
        let dir = self.home().join(".config").join("opskit");
        fs::create_dir_all(&dir).unwrap();
        let config = serde_json::json!({ "defaults": defaults });
        fs::write(dir.join("opskit.json"), config.to_string()).unwrap();
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_opskit"));
        cmd.args(args)
            .current_dir(self.path())
            .env("HOME", self.home())
            .env_remove("XDG_CONFIG_HOME")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_NAME", "Ops")
            .env("GIT_AUTHOR_EMAIL", "ops@example.com")
            .env("GIT_COMMITTER_NAME", "Ops")
            .env("GIT_COMMITTER_EMAIL", "ops@example.com");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).stdin(Stdio::null()).output().unwrap()
    }

    pub fn run_with_stdin(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        child.wait_with_output().unwrap()
    }

    /// Run git in `dir` with the sandbox environment.
    pub fn git(&self, dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("HOME", self.home())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_NAME", "Ops")
            .env("GIT_AUTHOR_EMAIL", "ops@example.com")
            .env("GIT_COMMITTER_NAME", "Ops")
            .env("GIT_COMMITTER_EMAIL", "ops@example.com")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    /// Fresh repository on branch `main` with one commit.
    pub fn init_repo(&self, dir: &Path) {
        self.init_repo_on(dir, "main");
    }

    /// Fresh repository on `branch` with one commit.
    pub fn init_repo_on(&self, dir: &Path, branch: &str) {
        fs::create_dir_all(dir).unwrap();
        self.git(dir, &["init", "-q"]);
        let head = format!("refs/heads/{}", branch);
        self.git(dir, &["symbolic-ref", "HEAD", &head]);
        fs::write(dir.join("README.md"), "hello\n").unwrap();
        self.git(dir, &["add", "README.md"]);
        self.git(dir, &["commit", "-q", "-m", "initial"]);
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn envelope(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}
