use clap::Args;

use opskit::defaults;
use opskit::watermark::{self, WatermarkOutput};

use super::CmdResult;
use crate::output::TextReport;

#[derive(Args)]
pub struct WatermarkArgs {
    /// Folder to scan for .jpg files (default: defaults.watermark.input)
    #[arg(long)]
    pub input: Option<String>,

    /// Folder for watermarked copies (default: defaults.watermark.output)
    #[arg(long)]
    pub output: Option<String>,

    /// Watermark image, usually a PNG with transparency (default: defaults.watermark.watermark)
    #[arg(long)]
    pub watermark: Option<String>,
}

impl TextReport for WatermarkOutput {
    fn text_lines(&self) -> Vec<String> {
        vec![format!(
            "Watermarked {} images into {}",
            self.files.len(),
            self.output_dir
        )]
    }
}

pub fn run(args: WatermarkArgs, _global: &super::GlobalArgs) -> CmdResult<WatermarkOutput> {
    let mut config = defaults::load_defaults()?.watermark;
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(watermark) = args.watermark {
        config.watermark = watermark;
    }

    Ok((watermark::watermark_folder(&config)?, 0))
}
