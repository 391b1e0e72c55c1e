//! Scheduled service bounce: revive the pm2 process table, restart one entry,
//! then bring the compose stack back up.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::command::{self, CapturedOutput};
use crate::defaults::RestartConfig;
use crate::error::{Error, Result};
use crate::{log_info, paths};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartStep {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(flatten)]
    pub output: CapturedOutput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartOutput {
    pub process_id: String,
    pub compose_dir: String,
    pub steps: Vec<RestartStep>,
}

/// Run one step, with `cwd` applied to the child process only.
pub fn run_step(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<RestartStep> {
    let display = command::display_command(program, args);
    log_info!("Running {}", display);
    let output = command::run_captured(program, args, cwd)?;
    Ok(RestartStep {
        command: display,
        cwd: cwd.map(|d| d.display().to_string()),
        output,
    })
}

fn compose_invocation(config: &RestartConfig) -> Result<(&str, Vec<&str>)> {
    let (program, leading) = config.compose_command.split_first().ok_or_else(|| {
        Error::config_invalid_value(
            "defaults.restart.compose_command",
            None,
            "Compose command cannot be empty",
        )
    })?;

    let args = leading
        .iter()
        .chain(config.compose_args.iter())
        .map(String::as_str)
        .collect();
    Ok((program.as_str(), args))
}

/// Resurrect + restart the pm2 entry, then `up -d` the compose stack.
///
/// Stops at the first failing step. The caller's working directory is never
/// changed; the compose step runs with its own `cwd`.
pub fn restart(config: &RestartConfig) -> Result<RestartOutput> {
    let compose_dir: PathBuf = paths::expand(&config.compose_dir)?;
    let (compose_program, compose_args) = compose_invocation(config)?;

    let steps = vec![
        run_step(&config.pm2_binary, &["resurrect"], None)?,
        run_step(&config.pm2_binary, &["restart", &config.process_id], None)?,
        run_step(compose_program, &compose_args, Some(&compose_dir))?,
    ];

    Ok(RestartOutput {
        process_id: config.process_id.clone(),
        compose_dir: compose_dir.display().to_string(),
        steps,
    })
}
