use clap::Args;
use std::path::PathBuf;

use opskit::changelog::{self, ChangelogOptions, ChangelogOutput};
use opskit::log::{format_line, Level};
use opskit::{defaults, paths};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct ChangelogArgs {
    /// Repository to read tags and commits from
    #[arg(long, default_value = ".")]
    pub repo: String,

    /// Output file, relative to the repository (default: defaults.changelog.output)
    #[arg(long)]
    pub output: Option<String>,

    /// Set the version in info.json to the newest tag
    #[arg(long)]
    pub bump: bool,

    /// Commit changelog and info.json as `release: <tag>` and move the tag (requires --bump)
    #[arg(long, requires = "bump")]
    pub commit: bool,
}

impl TextReport for ChangelogOutput {
    fn text_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}: {} items", e.version, e.items))
            .collect();
        if let Some(bump) = &self.bumped {
            lines.push(format_line(
                Level::Info,
                &format!("Version {} -> {}", bump.from, bump.to),
            ));
        }
        lines
    }
}

pub fn run(args: ChangelogArgs, _global: &super::GlobalArgs) -> CmdResult<ChangelogOutput> {
    let config = defaults::load_defaults()?.changelog;

    let options = ChangelogOptions {
        repo: paths::expand(&args.repo)?,
        output: PathBuf::from(args.output.unwrap_or(config.output)),
        info_json: PathBuf::from(config.info_json),
        width: config.wrap_width,
        bump: args.bump,
        commit: args.commit,
    };

    Ok((changelog::generate(&options)?, 0))
}
