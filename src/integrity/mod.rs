//! Dataset integrity: content hashing, the hash store, directory
//! reconciliation and split consistency

mod backup;
mod hash;
mod splits;
mod store;

pub(crate) use backup::{DiffOptions, DirDiff, diff_dirs};
pub(crate) use splits::{SplitIssue, SplitReport, check_splits, remove_invalid};
pub(crate) use store::{ComputeSummary, HashStore, VerifyReport, compute_missing, verify};
