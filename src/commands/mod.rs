use crate::output::OutputFormat;

pub type CmdResult<T> = opskit::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub format: OutputFormat,
}

pub mod changelog;
pub mod config;
pub mod csv;
pub mod extract;
pub mod json;
pub mod provision;
pub mod restart;
pub mod watermark;

/// Run a command handler and render its result; evaluates to the exit code.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::render($module::run($args, $global), $global.format)
    };
}

pub(crate) fn run(command: crate::Commands, global: &GlobalArgs) -> i32 {
    match command {
        crate::Commands::Extract(args) => dispatch!(args, global, extract),
        crate::Commands::Csv(args) => dispatch!(args, global, csv),
        crate::Commands::Provision(args) => dispatch!(args, global, provision),
        crate::Commands::Restart(args) => dispatch!(args, global, restart),
        crate::Commands::Changelog(args) => dispatch!(args, global, changelog),
        crate::Commands::Json(args) => dispatch!(args, global, json),
        crate::Commands::Watermark(args) => dispatch!(args, global, watermark),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
