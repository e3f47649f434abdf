use anyhow::Result;
use imgseq_core::{recover_operation, Config, OutputFormatter};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::list::with_newline;
use crate::CommandStatus;

pub fn handle_recover(
    dir: &Path,
    dry_run: bool,
    config: &Config,
    output: OutputFormat,
) -> Result<CommandStatus> {
    let result = recover_operation(
        dir,
        dry_run,
        &config.defaults.retry_policy(),
        config.defaults.write_log,
    )?;

    print!("{}", with_newline(result.format(output.into())));

    if result.report.is_clean() {
        Ok(CommandStatus::Success)
    } else {
        Ok(CommandStatus::Failed)
    }
}
