use anyhow::Result;
use imgseq_core::preview::should_use_color;
use imgseq_core::{
    rename_operation, CancelToken, Config, OutputFormatter, Preview, Progress, RenameOptions,
};
use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::list::with_newline;
use crate::CommandStatus;

pub struct RenameArgs<'a> {
    pub dir: &'a Path,
    pub prefix: String,
    pub preview: Preview,
    pub dry_run: bool,
    pub no_log: bool,
    pub auto_approve: bool,
    pub use_color: Option<bool>,
    pub output: OutputFormat,
}

pub fn handle_rename(args: RenameArgs<'_>, config: &Config, cancel: &CancelToken) -> Result<CommandStatus> {
    let options = RenameOptions {
        prefix: args.prefix,
        dry_run: args.dry_run,
        auto_approve: args.auto_approve,
        preview: args.preview,
        use_color: should_use_color(args.use_color),
        lister: config.defaults.lister(),
        retry: config.defaults.retry_policy(),
        write_log: config.defaults.write_log && !args.no_log,
        cancel: Some(cancel.clone()),
    };

    let show_progress = args.output == OutputFormat::Summary && io::stderr().is_terminal();
    let mut drawn = false;
    let report = rename_operation(args.dir, &options, |progress: Progress| {
        if show_progress {
            draw_progress(progress);
            drawn = true;
        }
    })?;
    if drawn {
        eprintln!();
    }

    print!("{}", with_newline(report.format(args.output.into())));

    if report.is_success() {
        Ok(CommandStatus::Success)
    } else {
        Ok(CommandStatus::Failed)
    }
}

fn draw_progress(progress: Progress) {
    let mut stderr = io::stderr();
    let _ = write!(
        stderr,
        "\rRenaming... {}/{} ({}%)",
        progress.completed,
        progress.total,
        progress.percent()
    );
    let _ = stderr.flush();
}
