use clap::Args;

use opskit::defaults;
use opskit::log::{format_line, Level};
use opskit::provision::{self, ProvisionOutput};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct ProvisionArgs {
    /// Repository name (letters, digits, `_`, `.`, `-`)
    pub name: Option<String>,

    /// Command Git-Auto-Deploy runs after each pull; prompted for when omitted
    #[arg(long, value_name = "CMD")]
    pub deploy_command: Option<String>,
}

impl TextReport for ProvisionOutput {
    fn text_lines(&self) -> Vec<String> {
        vec![
            format_line(Level::Info, &format!("Webhook URL: {}", self.webhook_url)),
            format_line(Level::Info, &format!("Secret token: {}", self.secret_token)),
            format_line(
                Level::Info,
                &format!(
                    "Restart {} to pick up the new repository (e.g. systemctl restart {})",
                    self.service_name, self.service_name
                ),
            ),
        ]
    }
}

pub fn run(args: ProvisionArgs, _global: &super::GlobalArgs) -> CmdResult<ProvisionOutput> {
    let name = provision::validate_repo_name(args.name.as_deref())?;
    let config = defaults::load_defaults()?.provision;
    let plan = provision::plan(name, &config)?;

    let deploy_command = args.deploy_command;
    let output = provision::provision(&plan, config.register_safe_directory, move || {
        match deploy_command {
            Some(command) => Ok(command),
            None => crate::tty::prompt("Deploy command: "),
        }
    })?;

    Ok((output, 0))
}
