use clap::Args;
use serde::Serialize;
use std::io::BufReader;

use opskit::defaults;
use opskit::extract::{self, ModelMatch};
use opskit::{io, paths};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct ExtractArgs {
    /// Path list to scan, `-` for stdin (default: defaults.extract.input)
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    input: String,
    matches: Vec<ModelMatch>,
}

impl TextReport for ExtractOutput {
    fn text_lines(&self) -> Vec<String> {
        self.matches.iter().map(ToString::to_string).collect()
    }
}

pub fn run(args: ExtractArgs, _global: &super::GlobalArgs) -> CmdResult<ExtractOutput> {
    let config = defaults::load_defaults()?.extract;
    let input = args.input.unwrap_or_else(|| config.input.clone());

    let matches = if input == "-" {
        extract::extract_models(std::io::stdin().lock(), &config)?
    } else {
        let path = paths::expand(&input)?;
        let file = io::open_file(&path, "read path list")?;
        extract::extract_models(BufReader::new(file), &config)?
    };

    Ok((ExtractOutput { input, matches }, 0))
}
