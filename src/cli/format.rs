//! Output formatting for CLI display.

use crate::model::{AbortKind, Outcome};

/// One-line summary of how a run ended.
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Aborted(abort) => {
            let kind = match abort.kind() {
                AbortKind::Gate => "branch check",
                AbortKind::Pull => "pull",
                AbortKind::TestMutation => "test marker",
            };
            format!("aborted at {kind}: {abort}")
        }
        Outcome::NoChanges => "no changes".to_string(),
        Outcome::NothingToCommit => "nothing to commit".to_string(),
        Outcome::CommittedNotPushed {
            branch,
            push_error: None,
        } => format!("committed on {branch}, not pushed"),
        Outcome::CommittedNotPushed {
            branch,
            push_error: Some(_),
        } => format!("committed on {branch}, push failed"),
        Outcome::CommittedAndPushed { branch, changes } => {
            let noun = if *changes == 1 { "change" } else { "changes" };
            format!("pushed {changes} {noun} to {branch}")
        }
    }
}
