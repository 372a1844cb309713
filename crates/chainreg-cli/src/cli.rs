use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chainreg",
    about = "chainreg: keep a per-chain asset and contract registry propagated, sorted and valid",
    version
)]
pub struct Cli {
    /// Registry root holding one directory per chain
    #[arg(long, global = true, env = "ROOT_DIR", default_value = ".")]
    pub root: PathBuf,

    /// Log filter (trace, debug, info, warn, error, or env-filter directives)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Worker threads for per-chain work (default: one per core)
    #[arg(long, global = true)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Propagate, sort, persist and validate the whole registry
    Run {
        /// Ignore list (overrides chainreg.toml and the default ignore_error.txt)
        #[arg(long)]
        ignore_file: Option<PathBuf>,

        /// Report files that would be rewritten instead of writing them
        #[arg(long)]
        check: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Restrict the run to these record files
        files: Vec<PathBuf>,
    },

    /// Copy native display metadata onto bridged assets and persist asset files
    Propagate {
        /// Report files that would be rewritten instead of writing them
        #[arg(long)]
        check: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Restrict the run to these record files
        files: Vec<PathBuf>,
    },

    /// Put every record file into canonical order and formatting
    Sort {
        /// Report files that are not canonical instead of rewriting them
        #[arg(long)]
        check: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Restrict the run to these record files
        files: Vec<PathBuf>,
    },

    /// Validate the registry without writing anything
    Validate {
        /// Ignore list (overrides chainreg.toml and the default ignore_error.txt)
        #[arg(long)]
        ignore_file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Restrict validation to these record files
        files: Vec<PathBuf>,
    },
}
