use anyhow::Result;
use imgseq_core::{preview_operation, write_preview, Config, OutputFormatter, Preview};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::CommandStatus;

pub fn handle_preview(
    dir: &Path,
    prefix: &str,
    preview: Preview,
    config: &Config,
    use_color: Option<bool>,
    output: OutputFormat,
) -> Result<CommandStatus> {
    let result = preview_operation(dir, prefix, &config.defaults.lister())?;

    match output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => {
            write_preview(&result.rows, preview, use_color)?;
            print!("{}", result.format_summary());
        },
    }

    // Conflicts are reported, not treated as a failure of the preview itself
    Ok(CommandStatus::Success)
}
