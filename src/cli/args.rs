//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Value tree generator: Lever -> Business Objective -> Value Driver -> KPI
#[derive(Parser, Debug)]
#[command(name = "valtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workbook with Node_Master and Context_Applicability sheets (overrides config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub workbook: Option<PathBuf>,

    /// Verbosity: -v info, -vv debug, -vvv trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding a local .valtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The business context a tree is assembled for.
#[derive(Args, Debug, Clone)]
pub struct ContextArgs {
    /// Value intent, exact match
    pub value_intent: String,
    /// Industry, exact match
    pub industry: String,
    /// Function, exact match
    pub function: String,

    /// Minimum applicability weight (default from config)
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble and print the value tree for a context
    Tree {
        #[command(flatten)]
        context: ContextArgs,

        /// Indented list instead of tree drawing
        #[arg(long, conflicts_with = "json")]
        flat: bool,

        /// Emit tree and statistics as JSON
        #[arg(long)]
        json: bool,

        /// Append per-level statistics
        #[arg(short, long)]
        stats: bool,
    },

    /// Per-level node counts for a context
    Stats {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// List available value intents, industries and functions
    Contexts {
        /// Emit as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the workbook and report errors and warnings
    Validate,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
