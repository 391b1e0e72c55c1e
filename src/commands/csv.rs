use clap::Args;

use opskit::csv_rewrite::{self, RewriteSettings, RewriteSummary};
use opskit::{defaults, paths};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct CsvArgs {
    /// Input file (default: defaults.csv.input)
    #[arg(long)]
    pub input: Option<String>,

    /// Output file (default: defaults.csv.output)
    #[arg(long)]
    pub output: Option<String>,

    /// 1-based column to rewrite (default: defaults.csv.column)
    #[arg(long)]
    pub column: Option<usize>,

    /// Replacement rule; repeat for several. Replaces the configured rules.
    #[arg(long = "replace", value_name = "FROM=TO")]
    pub replace: Vec<String>,
}

impl TextReport for RewriteSummary {
    fn text_lines(&self) -> Vec<String> {
        vec![format!(
            "Processing complete. Rewrote {} of {} rows. Output saved to {}",
            self.changed_cells,
            self.rows,
            self.output.as_deref().unwrap_or("-")
        )]
    }
}

pub fn run(args: CsvArgs, _global: &super::GlobalArgs) -> CmdResult<RewriteSummary> {
    let config = defaults::load_defaults()?.csv;

    let rules = if args.replace.is_empty() {
        config.rules
    } else {
        args.replace
            .iter()
            .map(|raw| csv_rewrite::parse_rule(raw))
            .collect::<opskit::Result<Vec<_>>>()?
    };

    let settings = RewriteSettings {
        column: args.column.unwrap_or(config.column),
        rules,
    };
    let input = paths::expand(args.input.as_deref().unwrap_or(&config.input))?;
    let output = paths::expand(args.output.as_deref().unwrap_or(&config.output))?;

    let summary = csv_rewrite::rewrite_file(&input, &output, &settings)?;
    Ok((summary, 0))
}
