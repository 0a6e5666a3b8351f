//! Completeness filtering

use crate::error::AppError;

use super::types::{FieldPath, Session};

#[derive(Debug, Default)]
pub(crate) struct FilterOutcome {
    pub(crate) usable: Vec<Session>,
    pub(crate) total: usize,
}

impl FilterOutcome {
    pub(crate) fn dropped(&self) -> usize {
        self.total - self.usable.len()
    }

    pub(crate) fn summary(&self) -> String {
        format!(
            "{} of {} sessions are usable",
            self.usable.len(),
            self.total
        )
    }
}

/// Parse required field names, failing on the first unknown one.
pub(crate) fn parse_fields<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<FieldPath>, AppError> {
    inputs.iter().map(|s| s.as_ref().parse()).collect()
}

pub(crate) fn is_complete(session: &Session, required: &[FieldPath]) -> bool {
    required.iter().all(|field| session.has(field))
}

/// Keep sessions that have every required field, in their original order.
pub(crate) fn filter_complete(sessions: &[Session], required: &[FieldPath]) -> FilterOutcome {
    FilterOutcome {
        usable: sessions
            .iter()
            .filter(|session| is_complete(session, required))
            .cloned()
            .collect(),
        total: sessions.len(),
    }
}
