use anyhow::Result;
use imgseq_core::{list_operation, Config, OutputFormatter};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::CommandStatus;

pub fn handle_list(dir: &Path, config: &Config, output: OutputFormat) -> Result<CommandStatus> {
    let result = list_operation(dir, &config.defaults.lister())?;
    print!("{}", with_newline(result.format(output.into())));
    Ok(CommandStatus::Success)
}

pub fn with_newline(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
