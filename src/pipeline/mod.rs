//! Batch preprocessing of usable sessions

mod ledger;
mod media;
mod orchestrator;

pub(crate) use ledger::ProcessedLedger;
pub(crate) use media::FfmpegTools;
pub(crate) use orchestrator::{Orchestrator, PipelineOptions, RunSummary};
