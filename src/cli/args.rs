//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

use super::commands::Commands;

#[derive(Parser)]
#[command(name = "r3curate")]
#[command(
    about = "Session discovery, batch preprocessing and backup integrity checks for multi-modal piano recordings",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub(crate) quiet: bool,

    /// Do not draw progress bars
    #[arg(long, global = true)]
    pub(crate) no_progress: bool,

    /// Disable colored table output
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Read settings from this file instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        match &mut self.command {
            Commands::Pipeline(args) => {
                // For boolean flags, config only applies if CLI is false (default)
                if !args.resume && config.pipeline.resume {
                    args.resume = true;
                }
                if args.output_dir.is_none() {
                    args.output_dir = config.pipeline.output_dir.clone();
                }
                if args.scratch_parent.is_none() {
                    args.scratch_parent = config.pipeline.scratch_parent.clone();
                }
                if args.required.is_empty()
                    && let Some(required) = &config.pipeline.required
                {
                    args.required = required.clone();
                }
            }
            Commands::Sessions(args) => {
                if args.required.is_empty()
                    && let Some(required) = &config.pipeline.required
                {
                    args.required = required.clone();
                }
            }
            Commands::Hash(args) => {
                if args.hash_file.is_none() {
                    args.hash_file = config.integrity.hash_file.clone();
                }
                if args.video_dir.is_empty() {
                    args.video_dir = config.integrity.video_dirs.clone();
                }
            }
            Commands::Verify(args) => {
                if args.hash_file.is_none() {
                    args.hash_file = config.integrity.hash_file.clone();
                }
                if args.video_dir.is_empty() {
                    args.video_dir = config.integrity.video_dirs.clone();
                }
            }
            Commands::Diff(args) => {
                if args.left.is_none() {
                    args.left = config.backup.left.clone();
                }
                if args.right.is_none() {
                    args.right = config.backup.right.clone();
                }
                if args.ext.is_none() {
                    args.ext = config.backup.extension.clone();
                }
                if !args.recursive && config.backup.recursive {
                    args.recursive = true;
                }
            }
            Commands::Check(_) => {}
        }

        self
    }

    pub(crate) fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }

    pub(crate) fn show_progress(&self) -> bool {
        !self.no_progress && !self.quiet
    }
}
