//! CLI subcommand definitions

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Merge and split every usable session into the output directory
    Pipeline(PipelineArgs),
    /// List discovered sessions and whether they are usable
    Sessions(SessionsArgs),
    /// Hash videos that are not yet in the hash store
    Hash(HashArgs),
    /// Re-hash tracked videos and report mismatches
    Verify(VerifyArgs),
    /// Compare two backup directories
    Diff(DiffArgs),
    /// Check that video, FLAC and MIDI splits of each session line up
    Check(CheckArgs),
}

#[derive(Args)]
pub(crate) struct PipelineArgs {
    /// Dataset root directories to search for recordings
    #[arg(long = "root_dir", visible_alias = "root-dir", value_name = "DIR", num_args = 1.., required = true)]
    pub(crate) root_dir: Vec<PathBuf>,

    /// Regenerate outputs that already exist
    #[arg(long)]
    pub(crate) overwrite: bool,

    /// Where split segments and the processed-session list are written [default: ./processed_audio]
    #[arg(long = "output_dir", visible_alias = "output-dir", value_name = "DIR")]
    pub(crate) output_dir: Option<PathBuf>,

    /// Re-encode video parts while merging instead of stream copying
    #[arg(long)]
    pub(crate) reencode: bool,

    /// Skip sessions already listed in the processed-session file
    #[arg(long)]
    pub(crate) resume: bool,

    /// Fields a session must have, e.g. video.file_list midi.file
    #[arg(long, value_name = "FIELD", num_args = 1..)]
    pub(crate) required: Vec<String>,

    /// Directory in which the run's scratch directory is created
    #[arg(long, value_name = "DIR")]
    pub(crate) scratch_parent: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(short, long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct SessionsArgs {
    /// Dataset root directories to search for recordings
    #[arg(long = "root_dir", visible_alias = "root-dir", value_name = "DIR", num_args = 1.., required = true)]
    pub(crate) root_dir: Vec<PathBuf>,

    /// Fields a session must have to count as usable
    #[arg(long, value_name = "FIELD", num_args = 1..)]
    pub(crate) required: Vec<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct HashArgs {
    /// Hash store file (created if missing)
    #[arg(long, value_name = "FILE")]
    pub(crate) hash_file: Option<PathBuf>,

    /// Directories holding one subdirectory of videos per recording day
    #[arg(long, value_name = "DIR", num_args = 1..)]
    pub(crate) video_dir: Vec<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct VerifyArgs {
    /// Hash store file
    #[arg(long, value_name = "FILE")]
    pub(crate) hash_file: Option<PathBuf>,

    /// Directories holding one subdirectory of videos per recording day
    #[arg(long, value_name = "DIR", num_args = 1..)]
    pub(crate) video_dir: Vec<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct DiffArgs {
    /// First directory
    pub(crate) left: Option<PathBuf>,

    /// Second directory
    pub(crate) right: Option<PathBuf>,

    /// Only compare names with this extension
    #[arg(long, value_name = "EXT")]
    pub(crate) ext: Option<String>,

    /// Ignore dated names before this date (YYYYMMDD or YYYY-MM-DD)
    #[arg(short, long)]
    pub(crate) since: Option<String>,

    /// Ignore dated names after this date (YYYYMMDD or YYYY-MM-DD)
    #[arg(short, long)]
    pub(crate) until: Option<String>,

    /// Compare relative paths of whole trees instead of top-level names
    #[arg(short, long)]
    pub(crate) recursive: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Directories containing the split files to check
    #[arg(long = "root_dir", visible_alias = "root-dir", value_name = "DIR", num_args = 1.., required = true)]
    pub(crate) root_dir: Vec<PathBuf>,

    /// Write the issues as CSV to this file
    #[arg(short, long, value_name = "FILE")]
    pub(crate) output: Option<PathBuf>,

    /// Delete every file of sessions with inconsistent splits
    #[arg(long)]
    pub(crate) clean: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub(crate) json: bool,
}
