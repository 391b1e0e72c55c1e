//! CLI output: JSON envelope or plain text, plus exit code mapping.

mod response;
mod text;

pub use response::{exit_code_for_error, map_cmd_result_to_json, print_json_result};
pub use text::{print_text_result, TextReport};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// INFO/FATAL lines and results on stdout
    #[default]
    Text,
    /// JSON envelope on stdout, progress lines on stderr
    Json,
}

/// Print a command result in the requested format and return the exit code.
pub fn render<T: Serialize + TextReport>(result: opskit::Result<(T, i32)>, format: OutputFormat) -> i32 {
    match format {
        OutputFormat::Json => {
            let (json_result, exit_code) = map_cmd_result_to_json(result);
            print_json_result(json_result);
            exit_code
        }
        OutputFormat::Text => print_text_result(result),
    }
}
