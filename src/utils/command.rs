//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};

/// Captured output from command execution.
/// Reusable primitive for any command that executes external processes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: String, stderr: String) -> Self {
        Self { stdout, stderr }
    }
}

/// Render a program and its arguments the way a user would type them.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn execute(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    cmd.output().map_err(|e| {
        Error::internal_io(
            format!("Failed to run {}: {}", program, e),
            Some(display_command(program, args)),
        )
    })
}

/// Run a command, optionally in a directory, and capture its output.
///
/// A non-zero exit becomes `external.command_failed` carrying the exit code
/// and both streams.
pub fn run_captured(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CapturedOutput> {
    let output = execute(program, args, cwd)?;
    let captured = CapturedOutput::new(
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
    );

    if !output.status.success() {
        return Err(Error::external_command_failed(CommandFailedDetails {
            command: display_command(program, args),
            cwd: cwd.map(|d| d.display().to_string()),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: captured.stdout,
            stderr: captured.stderr,
        }));
    }

    Ok(captured)
}

/// Run a command and return trimmed stdout on success.
pub fn run(program: &str, args: &[&str]) -> Result<String> {
    run_captured(program, args, None).map(|o| o.stdout)
}

/// Run a command in a specific directory and return trimmed stdout on success.
pub fn run_in(dir: &Path, program: &str, args: &[&str]) -> Result<String> {
    run_captured(program, args, Some(dir)).map(|o| o.stdout)
}

/// Run a command, returning Ok(None) on failure instead of error.
///
/// Useful when command failure is expected/acceptable (e.g., reading an unset git config key).
pub fn run_optional(program: &str, args: &[&str], cwd: Option<&Path>) -> Option<String> {
    let output = execute(program, args, cwd).ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_succeeds_with_valid_command() {
        let result = run("echo", &["hello"]);
        assert_eq!(result.unwrap(), "hello");
    }

    #[test]
    fn run_fails_with_invalid_command() {
        let err = run("nonexistent_command_xyz", &[]).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn non_zero_exit_carries_exit_code() {
        let err = run_captured("sh", &["-c", "echo out; echo err >&2; exit 7"], None).unwrap_err();
        assert_eq!(err.code.as_str(), "external.command_failed");
        assert_eq!(err.details["exitCode"], 7);
        assert_eq!(err.details["stdout"], "out");
        assert_eq!(err.details["stderr"], "err");
    }

    #[test]
    fn run_in_uses_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_in(dir.path(), "pwd", &[]).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(&out).canonicalize().unwrap(), expected);
    }

    #[test]
    fn run_optional_returns_none_on_failure() {
        assert!(run_optional("false", &[], None).is_none());
    }

    #[test]
    fn run_optional_returns_none_on_empty_output() {
        assert!(run_optional("true", &[], None).is_none());
    }

    #[test]
    fn display_command_joins_args() {
        assert_eq!(display_command("pm2", &["restart", "0"]), "pm2 restart 0");
    }
}
