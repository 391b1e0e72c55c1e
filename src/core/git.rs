use serde::Serialize;
use std::path::Path;

use crate::command;
use crate::error::{Error, ErrorCode, Result};

// ============================================================================
// Low-level Git Primitives (path-based)
// ============================================================================

fn git_in(dir: &Path, args: &[&str]) -> Result<String> {
    command::run_in(dir, "git", args).map_err(into_git_error)
}

fn git(args: &[&str]) -> Result<String> {
    command::run("git", args).map_err(into_git_error)
}

fn into_git_error(err: Error) -> Error {
    if err.code != ErrorCode::ExternalCommandFailed {
        return err;
    }
    let stderr = err.details["stderr"].as_str().unwrap_or_default();
    Error::git_command_failed(format!("{}: {}", err.message, stderr)).with_details(err.details)
}

/// Clone a git repository to a target directory.
pub fn clone_repo(url: &str, target_dir: &Path, branch: Option<&str>) -> Result<()> {
    let target = target_dir.to_string_lossy().to_string();
    let mut args = vec!["clone"];
    if let Some(branch) = branch {
        args.extend(["--branch", branch]);
    }
    args.extend([url, target.as_str()]);
    git(&args).map(|_| ())
}

/// Check if a git working directory has no uncommitted changes.
pub fn is_workdir_clean(path: &Path) -> Result<bool> {
    Ok(git_in(path, &["status", "--porcelain"])?.is_empty())
}

// ============================================================================
// safe.directory (global git configuration)
// ============================================================================

/// Entries of `safe.directory` in the global git configuration.
pub fn safe_directories() -> Vec<String> {
    command::run_optional(
        "git",
        &["config", "--global", "--get-all", "safe.directory"],
        None,
    )
    .map(|out| out.lines().map(str::to_string).collect())
    .unwrap_or_default()
}

/// Add `dir` to the global `safe.directory` list unless it is already there.
/// Returns true when an entry was added.
pub fn ensure_safe_directory(dir: &Path) -> Result<bool> {
    let entry = dir.to_string_lossy().to_string();
    if safe_directories().iter().any(|d| d == &entry || d == "*") {
        return Ok(false);
    }
    git(&["config", "--global", "--add", "safe.directory", &entry])?;
    Ok(true)
}

// ============================================================================
// History
// ============================================================================

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub subject: String,
    pub body: String,
    /// Author date, ISO-like (`%ai`)
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    /// Author date of the tagged commit (`%ai`)
    pub date: String,
}

/// Tags sorted by creation date, newest first.
pub fn tags_newest_first(repo: &Path) -> Result<Vec<Tag>> {
    let output = git_in(repo, &["tag", "--sort=-creatordate"])?;

    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|name| {
            let date = git_in(repo, &["log", "-1", "--format=%ai", name])?;
            Ok(Tag {
                name: name.to_string(),
                date,
            })
        })
        .collect()
}

/// Commits reachable from `range` (anything `git log` accepts), newest first.
pub fn commits(repo: &Path, range: &str) -> Result<Vec<Commit>> {
    let format = format!("--format=%H{f}%s{f}%b{f}%ai{r}", f = "%x1f", r = "%x1e");
    let output = git_in(repo, &["log", &format, range])?;
    Ok(parse_log(&output))
}

/// Parse `git log` output produced with unit/record separators.
pub fn parse_log(output: &str) -> Vec<Commit> {
    output
        .split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches('\n');
            if record.trim().is_empty() {
                return None;
            }
            let mut fields = record.splitn(4, FIELD_SEP);
            let hash = fields.next()?.trim().to_string();
            let subject = fields.next()?.to_string();
            let body = fields.next()?.trim().to_string();
            let date = fields.next()?.trim().to_string();
            Some(Commit {
                hash,
                subject,
                body,
                date,
            })
        })
        .collect()
}

// ============================================================================
// Release operations
// ============================================================================

pub fn add(repo: &Path, files: &[&str]) -> Result<()> {
    let mut args = vec!["add", "--"];
    args.extend_from_slice(files);
    git_in(repo, &args).map(|_| ())
}

pub fn commit(repo: &Path, message: &str) -> Result<()> {
    git_in(repo, &["commit", "--message", message]).map(|_| ())
}

/// Create or move `tag` to HEAD.
pub fn force_tag(repo: &Path, tag: &str) -> Result<()> {
    git_in(repo, &["tag", "--force", tag]).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_splits_records() {
        let raw = format!(
            "abc{f}feat: one{f}- fix: two\nplain{f}2024-03-01 10:00:00 +0100{r}\ndef{f}chore{f}{f}2024-02-01 09:00:00 +0100{r}\n",
            f = FIELD_SEP,
            r = RECORD_SEP
        );
        let commits = parse_log(&raw);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "abc");
        assert_eq!(commits[0].subject, "feat: one");
        assert_eq!(commits[0].body, "- fix: two\nplain");
        assert_eq!(commits[1].body, "");
        assert_eq!(commits[1].date, "2024-02-01 09:00:00 +0100");
    }

    #[test]
    fn parse_log_empty_output() {
        assert!(parse_log("").is_empty());
    }

    #[test]
    fn git_failures_map_to_git_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = is_workdir_clean(dir.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "git.command_failed");
    }
}
