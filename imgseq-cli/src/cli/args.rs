use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use super::types::{OutputFormat, PreviewArg};

/// Sequentially rename the images in a folder, safely
#[derive(Parser, Debug)]
#[command(name = "imgseq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Assume yes for all prompts
    #[arg(short = 'y', long = "yes", global = true, env = "IMGSEQ_YES")]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the planned names and any conflicts without renaming
    Preview {
        /// Directory holding the images
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Text placed before each sequence number
        #[arg(long)]
        prefix: Option<String>,

        /// Preview format (defaults to the configured format)
        #[arg(long, value_enum)]
        preview: Option<PreviewArg>,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Rename every image to <prefix><number><extension>
    Rename {
        /// Directory holding the images
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Text placed before each sequence number
        #[arg(long)]
        prefix: Option<String>,

        /// Preview format shown before confirming
        #[arg(long, value_enum)]
        preview: Option<PreviewArg>,

        /// Show preview only, don't rename anything
        #[arg(long)]
        dry_run: bool,

        /// Don't write a batch log under <dir>/.imgseq/logs
        #[arg(long)]
        no_log: bool,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Restore files left under temp names by an interrupted batch
    Recover {
        /// Directory holding the images
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// List stranded files without restoring them
        #[arg(long)]
        dry_run: bool,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// List the images in a directory in sequence order
    List {
        /// Directory holding the images
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Print shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version {
        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}
