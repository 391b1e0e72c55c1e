use clap::Args;

use opskit::defaults;
use opskit::log::{format_line, Level};
use opskit::restart::{self, RestartOutput};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct RestartArgs {
    /// pm2 process id (default: defaults.restart.process_id)
    #[arg(long)]
    pub process_id: Option<String>,
}

impl TextReport for RestartOutput {
    fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for step in &self.steps {
            if !step.output.stdout.is_empty() {
                lines.push(step.output.stdout.clone());
            }
        }
        lines.push(format_line(
            Level::Info,
            &format!(
                "Restarted pm2 process {} and the stack in {}",
                self.process_id, self.compose_dir
            ),
        ));
        lines
    }
}

pub fn run(args: RestartArgs, _global: &super::GlobalArgs) -> CmdResult<RestartOutput> {
    let mut config = defaults::load_defaults()?.restart;
    if let Some(id) = args.process_id {
        config.process_id = id;
    }
    Ok((restart::restart(&config)?, 0))
}
