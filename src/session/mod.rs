//! Session model, discovery and completeness filtering

mod filter;
mod identity;
mod index;
mod types;

pub(crate) use filter::{filter_complete, is_complete, parse_fields};
pub(crate) use identity::{Modality, SessionId, split_number};
pub(crate) use index::{Discovery, PathIndex, Unaffiliated, UnaffiliatedReason};
pub(crate) use types::{FieldPath, Performance, Session};
