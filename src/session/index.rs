//! Session discovery
//!
//! Walks the dataset roots, classifies every file with a known extension and
//! groups them into sessions. Files that cannot be placed are reported, never
//! silently dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use tracing::{debug, warn};

use super::identity::{SessionId, classify};
use super::types::{Placement, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum UnaffiliatedReason {
    /// Name does not follow the session naming convention
    UnrecognizedName,
    /// The session already has a different file in that slot
    DuplicateComponent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Unaffiliated {
    pub(crate) path: PathBuf,
    pub(crate) reason: UnaffiliatedReason,
}

#[derive(Debug, Default)]
pub(crate) struct Discovery {
    pub(crate) sessions: Vec<Session>,
    pub(crate) unaffiliated: Vec<Unaffiliated>,
    /// Files under the scratch directory that matched no permanent session
    pub(crate) transient: usize,
}

pub(crate) struct PathIndex {
    roots: Vec<PathBuf>,
    scratch: Option<PathBuf>,
    extensions: Vec<String>,
}

impl PathIndex {
    pub(crate) fn new<I>(roots: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            roots: roots.into_iter().collect(),
            scratch: None,
            extensions: Vec::new(),
        }
    }

    /// Scratch contents may complete existing sessions but never create new ones.
    pub(crate) fn with_scratch(mut self, dir: PathBuf) -> Self {
        self.scratch = Some(dir);
        self
    }

    pub(crate) fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    fn in_scratch(&self, path: &Path) -> bool {
        self.scratch
            .as_deref()
            .is_some_and(|scratch| path.starts_with(scratch))
    }

    fn find_files(&self, root: &Path) -> BTreeSet<PathBuf> {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        let base = Pattern::escape(&root.to_string_lossy());

        let mut files = BTreeSet::new();
        for ext in &self.extensions {
            let pattern = format!("{base}/**/*.{ext}");
            match glob::glob_with(&pattern, options) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        if entry.is_file() {
                            files.insert(entry);
                        }
                    }
                }
                Err(e) => warn!(pattern = %pattern, error = %e, "invalid search pattern"),
            }
        }
        files
    }

    pub(crate) fn discover(&self) -> Discovery {
        let mut permanent = BTreeSet::new();
        for root in &self.roots {
            if !root.is_dir() {
                warn!(root = %root.display(), "root directory does not exist, skipping");
                continue;
            }
            if self.in_scratch(root) {
                continue;
            }
            permanent.extend(
                self.find_files(root)
                    .into_iter()
                    .filter(|path| !self.in_scratch(path)),
            );
        }

        let mut discovery = Discovery::default();
        let mut sessions: BTreeMap<SessionId, Session> = BTreeMap::new();

        for path in permanent {
            let Some(classified) = classify(&path) else {
                discovery.unaffiliated.push(Unaffiliated {
                    path,
                    reason: UnaffiliatedReason::UnrecognizedName,
                });
                continue;
            };
            let session = sessions
                .entry(classified.id.clone())
                .or_insert_with(|| Session::new(classified.id.clone()));
            if session.add_discovered(path.clone(), &classified) == Placement::SlotTaken {
                discovery.unaffiliated.push(Unaffiliated {
                    path,
                    reason: UnaffiliatedReason::DuplicateComponent,
                });
            }
        }

        if let Some(scratch) = self.scratch.as_deref().filter(|dir| dir.is_dir()) {
            for path in self.find_files(scratch) {
                let attached = classify(&path).is_some_and(|classified| {
                    sessions.get_mut(&classified.id).is_some_and(|session| {
                        session.add_discovered(path.clone(), &classified) == Placement::Added
                    })
                });
                if !attached {
                    debug!(path = %path.display(), "ignoring transient scratch file");
                    discovery.transient += 1;
                }
            }
        }

        discovery.sessions = sessions.into_values().collect();
        discovery
    }
}
