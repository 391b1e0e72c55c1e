use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{changelog, config, csv, extract, json, provision, restart, watermark, GlobalArgs};
use output::OutputFormat;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "opskit")]
#[command(version = VERSION)]
#[command(about = "Small operations tasks: asset lists, CSV fixes, deploy provisioning, restarts")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List model names referenced by a path list
    Extract(extract::ExtractArgs),
    /// Rewrite identifiers in one CSV column
    Csv(csv::CsvArgs),
    /// Clone a repository and register it with Git-Auto-Deploy
    Provision(provision::ProvisionArgs),
    /// Resurrect and restart the pm2 entry, then bring up the compose stack
    Restart(restart::RestartArgs),
    /// Generate a Factorio changelog.txt from git history
    Changelog(changelog::ChangelogArgs),
    /// Format JSON files prettier-style
    Json(json::JsonArgs),
    /// Watermark every JPEG in a folder
    Watermark(watermark::WatermarkArgs),
    /// Manage opskit.json
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    opskit::log::route_to_stderr(cli.format == OutputFormat::Json);
    let global = GlobalArgs { format: cli.format };

    let exit_code = commands::run(cli.command, &global);
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
