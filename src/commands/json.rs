use clap::{Args, Subcommand};
use serde::Serialize;

use opskit::{json_format, paths};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct JsonArgs {
    #[command(subcommand)]
    command: JsonCommand,
}

#[derive(Subcommand)]
enum JsonCommand {
    /// Print a JSON file in prettier layout
    Format {
        /// Files to format
        #[arg(required = true)]
        files: Vec<String>,

        /// Rewrite the files in place instead of printing them
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct FormattedFile {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct JsonOutput {
    command: String,
    files: Vec<FormattedFile>,
}

impl TextReport for JsonOutput {
    fn text_lines(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| match (&f.formatted, f.changed) {
                (Some(text), _) => text.clone(),
                (None, Some(true)) => format!("{} formatted", f.path),
                (None, _) => format!("{} unchanged", f.path),
            })
            .collect()
    }
}

pub fn run(args: JsonArgs, _global: &super::GlobalArgs) -> CmdResult<JsonOutput> {
    match args.command {
        JsonCommand::Format { files, write } => format(&files, write),
    }
}

fn format(files: &[String], write: bool) -> CmdResult<JsonOutput> {
    let mut results = Vec::new();
    for file in files {
        let path = paths::expand(file)?;
        let (formatted, changed) = json_format::format_file(&path, write)?;
        results.push(if write {
            FormattedFile {
                path: file.clone(),
                formatted: None,
                changed: Some(changed),
            }
        } else {
            FormattedFile {
                path: file.clone(),
                formatted: Some(formatted),
                changed: None,
            }
        });
    }

    Ok((
        JsonOutput {
            command: "json.format".to_string(),
            files: results,
        },
        0,
    ))
}
