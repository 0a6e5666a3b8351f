//! Split consistency: the video, FLAC and MIDI splits of a session must pair
//! up one to one, numbered from 1. Only names and sizes are inspected.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::session::{Modality, Session, SessionId, split_number};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SplitIssue {
    pub(crate) session: SessionId,
    pub(crate) video: Option<PathBuf>,
    pub(crate) flac: Option<PathBuf>,
    pub(crate) issue: String,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct SplitReport {
    pub(crate) checked: usize,
    pub(crate) issues: Vec<SplitIssue>,
}

impl SplitReport {
    pub(crate) fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }

    /// Sessions with at least one issue, in report order.
    pub(crate) fn invalid_sessions(&self) -> Vec<&SessionId> {
        let mut seen = HashSet::new();
        self.issues
            .iter()
            .map(|issue| &issue.session)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

fn size_issue(modality: Modality, path: &Path) -> Option<String> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Some(format!("empty {} split", modality.name())),
        Ok(_) => None,
        Err(e) => Some(format!("cannot read {} split: {e}", modality.name())),
    }
}

fn check_session(session: &Session, issues: &mut Vec<SplitIssue>) {
    let video = &session.video.splits_list;
    let flac = &session.flac.splits_list;
    let midi = &session.midi.splits_list;
    let mut report = |video: Option<&PathBuf>, flac: Option<&PathBuf>, issue: String| {
        issues.push(SplitIssue {
            session: session.id().clone(),
            video: video.cloned(),
            flac: flac.cloned(),
            issue,
        });
    };

    if video.len() != flac.len() || video.len() != midi.len() {
        report(
            None,
            None,
            format!(
                "split counts differ: video {}, flac {}, midi {}",
                video.len(),
                flac.len(),
                midi.len()
            ),
        );
    }

    let mut expected = 1;
    for ((v, f), m) in video.iter().zip(flac).zip(midi) {
        let numbers = [v, f, m].map(|path| split_number(path).unwrap_or(0));
        if numbers[0] != numbers[1] || numbers[0] != numbers[2] {
            report(
                Some(v),
                Some(f),
                format!(
                    "split numbers differ: video {}, flac {}, midi {}",
                    numbers[0], numbers[1], numbers[2]
                ),
            );
        } else if numbers[0] != expected {
            report(
                Some(v),
                Some(f),
                format!("expected split {expected}, found split {}", numbers[0]),
            );
        }
        expected = numbers[0] + 1;

        for (modality, path) in [(Modality::Video, v), (Modality::Flac, f), (Modality::Midi, m)] {
            if let Some(issue) = size_issue(modality, path) {
                report(Some(v), Some(f), issue);
            }
        }
    }
}

/// Compare the splits of every session. Callers pass sessions that have all
/// three split lists.
pub(crate) fn check_splits(sessions: &[Session], progress: &ProgressBar) -> SplitReport {
    let mut report = SplitReport::default();
    for session in sessions {
        progress.set_message(session.id().to_string());
        let before = report.issues.len();
        check_session(session, &mut report.issues);
        if report.issues.len() > before {
            progress.suspend(|| {
                warn!(
                    session = %session.id(),
                    issues = report.issues.len() - before,
                    "splits are inconsistent"
                )
            });
        }
        report.checked += 1;
        progress.inc(1);
    }
    report
}

/// Delete every file of the sessions the report flags. Returns the removed paths.
pub(crate) fn remove_invalid(
    sessions: &[Session],
    report: &SplitReport,
) -> Result<Vec<PathBuf>, AppError> {
    let invalid = report.invalid_sessions();
    let mut removed = Vec::new();
    for session in sessions.iter().filter(|s| invalid.contains(&s.id())) {
        for path in session.all_files() {
            fs::remove_file(path).map_err(|source| AppError::Remove {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "removed");
            removed.push(path.clone());
        }
        warn!(session = %session.id(), "removed files of inconsistent session");
    }
    Ok(removed)
}
