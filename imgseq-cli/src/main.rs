use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use imgseq_core::{on_interrupt, CancelToken, Config, InterruptAction, OutputFormatter, VersionResult};
use std::io;
use std::process;

mod cli;
mod list;
mod preview;
mod recover;
mod rename;

use cli::{resolve_preview, Cli, Commands, OutputFormat};

/// How a command finished when it did not hit an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Ran to the end but some files could not be renamed or restored
    Failed,
}

fn main() {
    let cancel = CancelToken::new();

    // SIGINT exits at the confirmation prompt, otherwise it cancels the running batch
    let token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || match on_interrupt(&token) {
        InterruptAction::ExitNow => {
            eprintln!("\nAborted.");
            process::exit(130);
        },
        InterruptAction::CancelBatch => {
            eprintln!("\nReceived SIGINT. Finishing files already in flight...");
        },
    }) {
        eprintln!("Warning: failed to install SIGINT handler: {e}");
    }

    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGTERM, cancel.flag()) {
        eprintln!("Warning: failed to install SIGTERM handler: {e}");
    }

    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        if let Err(e) = std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
        {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        },
    };

    let use_color = if cli.no_color {
        Some(false)
    } else {
        config.defaults.use_color
    };

    let result = run(cli, &config, use_color, &cancel);

    if cancel.is_cancelled() {
        eprintln!("Operation cancelled; files not yet started were left untouched");
        process::exit(130);
    }

    match result {
        Ok(CommandStatus::Success) => process::exit(0),
        Ok(CommandStatus::Failed) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        },
    }
}

fn run(cli: Cli, config: &Config, use_color: Option<bool>, cancel: &CancelToken) -> Result<CommandStatus> {
    match cli.command {
        Commands::Preview {
            dir,
            prefix,
            preview,
            output,
        } => preview::handle_preview(
            &dir,
            &resolve_prefix(prefix, config),
            resolve_preview(preview, &config.defaults.preview_format, output),
            config,
            use_color,
            output,
        ),

        Commands::Rename {
            dir,
            prefix,
            preview,
            dry_run,
            no_log,
            output,
        } => rename::handle_rename(
            rename::RenameArgs {
                dir: &dir,
                prefix: resolve_prefix(prefix, config),
                preview: resolve_preview(preview, &config.defaults.preview_format, output),
                dry_run,
                no_log,
                auto_approve: cli.yes,
                use_color,
                output,
            },
            config,
            cancel,
        ),

        Commands::Recover {
            dir,
            dry_run,
            output,
        } => recover::handle_recover(&dir, dry_run, config, output),

        Commands::List { dir, output } => list::handle_list(&dir, config, output),

        Commands::Completions { shell } => {
            generate_completions(shell, &mut Cli::command(), "imgseq", &mut io::stdout())?;
            Ok(CommandStatus::Success)
        },

        Commands::Version { output } => handle_version(output),
    }
}

/// Prefix from the flag, then the config file, then none.
fn resolve_prefix(arg: Option<String>, config: &Config) -> String {
    arg.or_else(|| config.defaults.prefix.clone())
        .unwrap_or_default()
}

// Generate shell completions
pub fn generate_completions<G: clap_complete::Generator>(
    gen: G,
    cmd: &mut clap::Command,
    name: &str,
    out: &mut dyn io::Write,
) -> Result<()> {
    clap_complete::generate(gen, cmd, name, out);
    out.flush().context("Failed to write completions")?;
    Ok(())
}

fn handle_version(output: OutputFormat) -> Result<CommandStatus> {
    let version_result = VersionResult {
        name: "imgseq".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let formatted = match output {
        OutputFormat::Json => version_result.format_json(),
        OutputFormat::Summary => version_result.format_summary(),
    };

    println!("{}", formatted.trim_end());
    Ok(CommandStatus::Success)
}
