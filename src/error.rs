use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionId;

/// Precondition failures: anything that must abort before work starts.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Invalid date \"{input}\" (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("Output path {} should be a directory, not a file", path.display())]
    OutputNotDirectory { path: PathBuf },

    #[error("Directory does not exist: {}", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("Unknown session field \"{input}\" (expected <video|audio|midi|flac>.<file|file_list|trimmed|splits_list>)")]
    UnknownField { input: String },

    #[error("Missing {what}: pass it on the command line or set it in the config file")]
    MissingSetting { what: &'static str },

    #[error("Failed to read config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Failed to prepare {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    HashStore(#[from] HashStoreError),
}

/// Errors reading or writing a hash store file.
#[derive(Debug, Error)]
pub(crate) enum HashStoreError {
    #[error("{}:{line}: expected 2 tab-separated fields, found {found}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    #[error("{}:{line}: invalid hash \"{value}\"", path.display())]
    InvalidHash {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Hash store I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Faults confined to a single session; the orchestrator logs these and moves on.
#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("{} belongs to session {found}, not {expected}", path.display())]
    IdentityMismatch {
        path: PathBuf,
        expected: SessionId,
        found: SessionId,
    },

    #[error("{} does not follow the session naming convention", path.display())]
    Unclassified { path: PathBuf },

    #[error("session {id} has no {what}")]
    MissingComponent { id: SessionId, what: &'static str },

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("Failed to record session in {}: {source}", path.display())]
    Ledger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures from the external merge/split tooling.
#[derive(Debug, Error)]
pub(crate) enum MediaError {
    #[error("{program} not found. Please install it or set its path in the config file.")]
    NotFound { program: String },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("No split command configured; set media.split_command in the config file")]
    NoSplitCommand,

    #[error("Nothing to merge: no {what}")]
    NothingToMerge { what: String },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
