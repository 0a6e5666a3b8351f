//! Batch driver: merge, split and record each usable session in turn.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::SessionError;
use crate::session::{Modality, Session, SessionId};

use super::ledger::ProcessedLedger;
use super::media::{MediaTools, SplitRequest};

#[derive(Debug, Clone)]
pub(crate) struct PipelineOptions {
    pub(crate) output_dir: PathBuf,
    pub(crate) scratch_dir: PathBuf,
    pub(crate) overwrite: bool,
    pub(crate) reencode: bool,
}

/// Where a session's processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Step {
    Merging,
    Splitting,
    Recording,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Merging => "merging",
            Step::Splitting => "splitting",
            Step::Recording => "recording",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SessionFailure {
    pub(crate) id: SessionId,
    pub(crate) step: Step,
    pub(crate) message: String,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) usable: usize,
    pub(crate) processed: Vec<SessionId>,
    pub(crate) skipped: Vec<SessionId>,
    pub(crate) failures: Vec<SessionFailure>,
}

/// Merge outputs owned by one session; removed when dropped, whatever the outcome.
struct ScratchArtifacts<'a> {
    scratch: &'a Path,
    paths: Vec<PathBuf>,
}

impl<'a> ScratchArtifacts<'a> {
    fn new(scratch: &'a Path) -> Self {
        Self {
            scratch,
            paths: Vec::new(),
        }
    }

    /// Only paths inside the scratch directory are taken; anything else is user data.
    fn track(&mut self, artifacts: &[PathBuf]) {
        self.paths.extend(
            artifacts
                .iter()
                .filter(|path| path.starts_with(self.scratch))
                .cloned(),
        );
    }
}

impl Drop for ScratchArtifacts<'_> {
    fn drop(&mut self) {
        for path in &self.paths {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed scratch artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch artifact"),
            }
        }
    }
}

pub(crate) struct Orchestrator<'a, M: MediaTools + ?Sized> {
    tools: &'a M,
    options: &'a PipelineOptions,
}

impl<'a, M: MediaTools + ?Sized> Orchestrator<'a, M> {
    pub(crate) fn new(tools: &'a M, options: &'a PipelineOptions) -> Self {
        Self { tools, options }
    }

    /// Process sessions sequentially in the order given. A failing session is
    /// logged and left out of the ledger; the run carries on with the next one.
    pub(crate) fn run(
        &self,
        sessions: Vec<Session>,
        ledger: &mut ProcessedLedger,
        progress: &ProgressBar,
    ) -> RunSummary {
        let mut summary = RunSummary {
            usable: sessions.len(),
            ..RunSummary::default()
        };

        for session in sessions {
            let id = session.id().clone();
            progress.set_message(id.to_string());

            if ledger.already_processed(&id) {
                progress.suspend(|| info!(session = %id, "already processed, skipping"));
                summary.skipped.push(id);
                progress.inc(1);
                continue;
            }

            match self.process(session, ledger) {
                Ok(()) => {
                    progress.suspend(|| info!(session = %id, "processed"));
                    summary.processed.push(id);
                }
                Err((step, err)) => {
                    progress.suspend(|| error!(session = %id, %step, error = %err, "session failed"));
                    summary.failures.push(SessionFailure {
                        id,
                        step,
                        message: err.to_string(),
                    });
                }
            }
            progress.inc(1);
        }

        summary
    }

    fn process(
        &self,
        session: Session,
        ledger: &mut ProcessedLedger,
    ) -> Result<(), (Step, SessionError)> {
        let options = self.options;
        let mut artifacts = ScratchArtifacts::new(&options.scratch_dir);

        let session = if session.needs_merge() {
            debug!(session = %session.id(), "merging");
            let merged = self
                .tools
                .merge(&session, &options.scratch_dir, options.overwrite, options.reencode)
                .map_err(|e| (Step::Merging, e.into()))?;
            artifacts.track(&merged);
            session
                .with_artifacts(&merged)
                .map_err(|e| (Step::Merging, e))?
        } else {
            session
        };

        let splitting = |e: SessionError| (Step::Splitting, e);
        let performance = session.performance().map_err(splitting)?;
        let request = SplitRequest {
            midi: &performance.midi,
            flac: session.require_file(Modality::Flac).map_err(splitting)?,
            audio: session.require_file(Modality::Audio).map_err(splitting)?,
            performance: &performance,
            video: session.require_file(Modality::Video).map_err(splitting)?,
            output_dir: &options.output_dir,
            overwrite: options.overwrite,
        };
        debug!(session = %session.id(), "splitting");
        self.tools
            .split(&request)
            .map_err(|e| (Step::Splitting, e.into()))?;

        let done = session.into_split();
        drop(artifacts);
        debug!(session = %done.id(), stage = ?done.stage(), "split complete");

        ledger
            .record(done.id())
            .map_err(|source| {
                (
                    Step::Recording,
                    SessionError::Ledger {
                        path: ledger.path().to_path_buf(),
                        source,
                    },
                )
            })?;
        Ok(())
    }
}
