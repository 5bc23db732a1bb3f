//! Core data model for report-sync.
//!
//! Change records produced from repository status, and the outcome
//! of a sync run.

mod change;
mod outcome;

pub use change::{ChangeRecord, ChangeStatus, commit_message, parse_status};
pub use outcome::{Abort, AbortKind, Outcome};
