use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;

use opskit::defaults::{self, Defaults, OpskitConfig};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display configuration (opskit.json merged over built-in defaults)
    Show {
        /// Show only built-in defaults (ignore opskit.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Set a configuration value at a JSON pointer path
    Set {
        /// JSON pointer path (e.g., /defaults/provision/apps_dir)
        pointer: String,
        /// Value to set (JSON)
        value: String,
    },
    /// Remove a configuration value at a JSON pointer path
    Remove {
        /// JSON pointer path (e.g., /defaults/csv/rules)
        pointer: String,
    },
    /// Reset configuration to built-in defaults (deletes opskit.json)
    Reset,
    /// Show the path to opskit.json
    Path,
}

#[derive(Debug, Default, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<OpskitConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults: Option<Defaults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<bool>,
}

impl ConfigOutput {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Self::default()
        }
    }
}

impl TextReport for ConfigOutput {
    fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(config) = &self.config {
            lines.push(serde_json::to_string_pretty(config).unwrap_or_default());
        }
        if let Some(defaults) = &self.defaults {
            lines.push(serde_json::to_string_pretty(defaults).unwrap_or_default());
        }
        if let Some(path) = &self.path {
            match self.exists {
                Some(false) => lines.push(format!("{} (not created yet)", path)),
                _ => lines.push(path.clone()),
            }
        }
        if let Some(deleted) = self.deleted {
            lines.push(if deleted {
                "Removed opskit.json".to_string()
            } else {
                "No opskit.json to remove".to_string()
            });
        }
        lines
    }
}

pub fn run(args: ConfigArgs, _global: &super::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin),
        ConfigCommand::Set { pointer, value } => set(&pointer, &value),
        ConfigCommand::Remove { pointer } => remove(&pointer),
        ConfigCommand::Reset => reset(),
        ConfigCommand::Path => path(),
    }
}

fn show(builtin: bool) -> CmdResult<ConfigOutput> {
    let mut output = ConfigOutput::new("config.show");
    if builtin {
        output.defaults = Some(defaults::builtin_defaults());
    } else {
        output.config = Some(defaults::load_config()?);
    }
    Ok((output, 0))
}

fn require_pointer(pointer: &str) -> opskit::Result<()> {
    if pointer.starts_with('/') {
        return Ok(());
    }
    Err(opskit::Error::validation_invalid_argument(
        "pointer",
        "JSON pointer must start with '/'",
        Some(pointer.to_string()),
        None,
    ))
}

/// Apply `edit` to the current config as JSON, then validate and save it.
fn edit_config<F>(edit: F) -> opskit::Result<OpskitConfig>
where
    F: FnOnce(&mut Value) -> opskit::Result<()>,
{
    let mut json = serde_json::to_value(defaults::load_config()?).map_err(|e| {
        opskit::Error::internal_json(e.to_string(), Some("serialize opskit.json".to_string()))
    })?;

    edit(&mut json)?;

    let config: OpskitConfig = serde_json::from_value(json).map_err(|e| {
        opskit::Error::validation_invalid_json(e, Some("deserialize config".to_string()), None)
    })?;
    defaults::save_config(&config)?;
    Ok(config)
}

fn set(pointer: &str, value_str: &str) -> CmdResult<ConfigOutput> {
    require_pointer(pointer)?;

    let value: Value = serde_json::from_str(value_str).map_err(|e| {
        opskit::Error::validation_invalid_json(
            e,
            Some("parse value".to_string()),
            Some(value_str.chars().take(200).collect::<String>()),
        )
    })?;

    let config = edit_config(|json| defaults::set_json_pointer(json, pointer, value.clone()))?;

    let mut output = ConfigOutput::new("config.set");
    output.config = Some(config);
    output.pointer = Some(pointer.to_string());
    output.value = Some(value);
    Ok((output, 0))
}

fn remove(pointer: &str) -> CmdResult<ConfigOutput> {
    require_pointer(pointer)?;

    let config = edit_config(|json| defaults::remove_json_pointer(json, pointer))?;

    let mut output = ConfigOutput::new("config.remove");
    output.config = Some(config);
    output.pointer = Some(pointer.to_string());
    Ok((output, 0))
}

fn reset() -> CmdResult<ConfigOutput> {
    let deleted = defaults::reset_config()?;

    let mut output = ConfigOutput::new("config.reset");
    output.path = Some(defaults::config_path()?);
    output.deleted = Some(deleted);
    Ok((output, 0))
}

fn path() -> CmdResult<ConfigOutput> {
    let mut output = ConfigOutput::new("config.path");
    output.path = Some(defaults::config_path()?);
    output.exists = Some(defaults::config_exists());
    Ok((output, 0))
}
