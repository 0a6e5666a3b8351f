//! Processed-session ledger
//!
//! One session id per line in `processed_sessions.txt`. Ids are appended as
//! each session completes. Prior contents are only read back in resume mode.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::consts::LEDGER_FILE;
use crate::session::SessionId;

#[derive(Debug)]
pub(crate) struct ProcessedLedger {
    path: PathBuf,
    prior: HashSet<String>,
    recorded: Vec<String>,
    /// Existing content lacks a trailing newline
    needs_separator: bool,
}

impl ProcessedLedger {
    pub(crate) fn open(output_dir: &Path, resume: bool) -> io::Result<Self> {
        let path = output_dir.join(LEDGER_FILE);
        if !path.exists() {
            fs::write(&path, "")?;
        }

        let content = fs::read_to_string(&path)?;
        let needs_separator = !content.is_empty() && !content.ends_with('\n');
        let prior = if resume {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };

        Ok(Self {
            path,
            prior,
            recorded: Vec::new(),
            needs_separator,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Completed in an earlier run. Always false unless opened in resume mode.
    pub(crate) fn already_processed(&self, id: &SessionId) -> bool {
        self.prior.contains(&id.to_string())
    }

    /// Append an id. Returns false without writing if it was already recorded this run.
    pub(crate) fn record(&mut self, id: &SessionId) -> io::Result<bool> {
        let id = id.to_string();
        if self.recorded.contains(&id) {
            return Ok(false);
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        if self.needs_separator {
            writeln!(file)?;
            self.needs_separator = false;
        }
        writeln!(file, "{id}")?;
        file.sync_data()?;

        self.recorded.push(id);
        Ok(true)
    }

    pub(crate) fn recorded(&self) -> &[String] {
        &self.recorded
    }
}
