//! Hash store: an append-only `basename<TAB>hash` table.
//!
//! ```text
//! # filename	hash
//! rach3_2022-03-15_a_p001.mp4	d0a0986287862f78714bfaea6fee8ae9
//! ```
//!
//! Rows are keyed by basename only so a store stays valid when the dataset
//! is reorganized across backup drives. Every computed row is written as
//! soon as it exists; an interrupted run leaves a loadable store and the
//! next run skips what was already hashed.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consts::HASH_STORE_HEADER;
use crate::error::HashStoreError;

use super::hash::ContentHash;

pub(crate) struct HashStore {
    path: PathBuf,
    hashes: HashMap<String, ContentHash>,
    /// Existing content lacks a trailing newline
    needs_separator: bool,
}

/// How the last line of a store file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    Terminated,
    /// A complete row with no newline after it
    Unterminated,
    /// A partial row left by an interrupted write; content before `keep` is intact
    Torn { keep: u64 },
}

struct Parsed {
    hashes: HashMap<String, ContentHash>,
    tail: Tail,
}

fn parse_row(path: &Path, line: usize, row: &str) -> Result<(String, ContentHash), HashStoreError> {
    let fields: Vec<&str> = row.split('\t').collect();
    let [name, hash] = fields.as_slice() else {
        return Err(HashStoreError::Parse {
            path: path.to_path_buf(),
            line,
            found: fields.len(),
        });
    };
    let hash = hash
        .trim()
        .parse::<ContentHash>()
        .map_err(|_| HashStoreError::InvalidHash {
            path: path.to_path_buf(),
            line,
            value: hash.to_string(),
        })?;
    Ok((name.to_string(), hash))
}

impl HashStore {
    /// Create the store with its header line if it does not exist yet.
    /// Returns whether a new file was created.
    pub(crate) fn ensure(path: &Path) -> Result<bool, HashStoreError> {
        if path.exists() {
            return Ok(false);
        }
        let io_err = |source| HashStoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, format!("{HASH_STORE_HEADER}\n")).map_err(io_err)?;
        Ok(true)
    }

    /// Malformed rows fail the whole load, except an unterminated final row,
    /// which is what an interrupted append leaves behind.
    fn parse(path: &Path) -> Result<Parsed, HashStoreError> {
        let content = fs::read_to_string(path).map_err(|source| HashStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut hashes = HashMap::new();
        let mut tail = Tail::Terminated;
        let mut offset = 0;
        for (idx, raw) in content.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            let start = offset;
            offset += raw.len();
            let terminated = raw.ends_with('\n');
            if !terminated {
                tail = Tail::Unterminated;
            }

            let row = raw.trim_end_matches(['\n', '\r']);
            if row.trim().is_empty() || row.starts_with('#') {
                continue;
            }
            match parse_row(path, line_no, row) {
                Ok((name, hash)) => {
                    if hashes.insert(name, hash).is_some() {
                        debug!(line = line_no, "later row overrides earlier hash");
                    }
                }
                Err(e) if !terminated => {
                    warn!(error = %e, "ignoring incomplete final row");
                    tail = Tail::Torn { keep: start as u64 };
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Parsed { hashes, tail })
    }

    /// Parse a store for reading.
    pub(crate) fn load(path: &Path) -> Result<HashMap<String, ContentHash>, HashStoreError> {
        Self::parse(path).map(|parsed| parsed.hashes)
    }

    /// Ensure then load. A torn final row is cut off so appends start on a
    /// clean line.
    pub(crate) fn open(path: &Path) -> Result<Self, HashStoreError> {
        if Self::ensure(path)? {
            info!(path = %path.display(), "created hash store");
        }
        let io_err = |source| HashStoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        let parsed = Self::parse(path)?;
        let needs_separator = match parsed.tail {
            Tail::Terminated => false,
            Tail::Unterminated => true,
            Tail::Torn { keep } => {
                OpenOptions::new()
                    .write(true)
                    .open(path)
                    .and_then(|file| file.set_len(keep))
                    .map_err(io_err)?;
                warn!(path = %path.display(), "removed incomplete final row");
                false
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            hashes: parsed.hashes,
            needs_separator,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.hashes.len()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.hashes.contains_key(name)
    }

    /// Append one row and flush it to disk before returning.
    pub(crate) fn append(&mut self, name: &str, hash: ContentHash) -> Result<(), HashStoreError> {
        let io_err = |source| HashStoreError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        if self.needs_separator {
            writeln!(file).map_err(io_err)?;
        }
        writeln!(file, "{name}\t{hash}").map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        self.needs_separator = false;
        self.hashes.insert(name.to_string(), hash);
        Ok(())
    }
}

/// Videos laid out as `<dir>/<subdir>/<name>.mp4`, sorted.
pub(crate) fn find_videos(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!("{}/*/*.mp4", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files = Vec::new();
    match glob::glob(&pattern) {
        Ok(entries) => {
            for entry in entries.flatten() {
                if entry.is_file() {
                    files.push(entry);
                }
            }
        }
        Err(e) => warn!(pattern = %pattern, error = %e, "invalid search pattern"),
    }
    files.sort();
    files
}

fn basename(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ComputeSummary {
    pub(crate) computed: usize,
    pub(crate) already_known: usize,
    /// Names that cannot be stored in a tab-separated row
    pub(crate) unstorable: Vec<PathBuf>,
}

/// Hash every video whose basename is not in the store yet.
pub(crate) fn compute_missing(
    store: &mut HashStore,
    video_dirs: &[PathBuf],
    progress: &ProgressBar,
) -> Result<ComputeSummary, HashStoreError> {
    let mut summary = ComputeSummary::default();
    for dir in video_dirs {
        let videos = find_videos(dir);
        progress.suspend(|| info!(dir = %dir.display(), videos = videos.len(), "scanning"));
        progress.set_length(videos.len() as u64);
        progress.set_position(0);

        for video in videos {
            progress.inc(1);
            let Some(name) = basename(&video).filter(|n| !n.contains(['\t', '\n', '\r'])) else {
                summary.unstorable.push(video);
                continue;
            };
            if store.contains(name) {
                summary.already_known += 1;
                continue;
            }
            progress.set_message(name.to_string());
            let hash = ContentHash::from_file(&video).map_err(|source| HashStoreError::Io {
                path: video.clone(),
                source,
            })?;
            progress.suspend(|| debug!(name, %hash, "computed"));
            store.append(name, hash)?;
            summary.computed += 1;
        }
    }
    Ok(summary)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct VerifyReport {
    pub(crate) checked: usize,
    /// Files on disk with no stored hash
    pub(crate) untracked: usize,
    pub(crate) mismatched: Vec<PathBuf>,
}

impl VerifyReport {
    pub(crate) fn is_intact(&self) -> bool {
        self.mismatched.is_empty()
    }
}

/// Recompute every tracked video and collect the ones whose hash changed.
pub(crate) fn verify(
    hash_file: &Path,
    video_dirs: &[PathBuf],
    progress: &ProgressBar,
) -> Result<VerifyReport, HashStoreError> {
    let hashes = HashStore::load(hash_file)?;
    let mut report = VerifyReport::default();

    for dir in video_dirs {
        progress.suspend(|| info!(dir = %dir.display(), "checking"));
        let (tracked, untracked): (Vec<_>, Vec<_>) = find_videos(dir)
            .into_iter()
            .partition(|video| basename(video).is_some_and(|n| hashes.contains_key(n)));

        if !untracked.is_empty() {
            progress.suspend(|| {
                warn!(
                    dir = %dir.display(),
                    count = untracked.len(),
                    "videos have no hash in the store"
                )
            });
        }
        report.untracked += untracked.len();

        progress.set_length(tracked.len() as u64);
        progress.set_position(0);
        for video in tracked {
            progress.inc(1);
            let Some(expected) = basename(&video).and_then(|n| hashes.get(n)) else {
                continue;
            };
            let actual = ContentHash::from_file(&video).map_err(|source| HashStoreError::Io {
                path: video.clone(),
                source,
            })?;
            report.checked += 1;
            if actual != *expected {
                progress.suspend(|| warn!(path = %video.display(), "hash does not match"));
                report.mismatched.push(video);
            }
        }
    }
    Ok(report)
}
