//! How a sync run ended.

use thiserror::Error;

/// Terminal state of one workflow run.
///
/// Only observed through printed output, notifications and the exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped before committing. Nothing was committed or pushed.
    Aborted(Abort),

    /// Mirror completed and the repository reported no changes.
    NoChanges,

    /// Status saw changes but `git commit` found nothing to record.
    NothingToCommit,

    /// Committed locally; the push was declined or failed.
    CommittedNotPushed {
        branch: String,
        /// `None` when the operator declined, the push error otherwise.
        push_error: Option<String>,
    },

    /// Committed and pushed to the remote.
    CommittedAndPushed { branch: String, changes: usize },
}

impl Outcome {
    /// Whether this outcome should make the process exit non-zero.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

/// Broad class of an abort, for logging and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortKind {
    /// The branch precondition could not be satisfied.
    Gate,
    /// `git pull` failed.
    Pull,
    /// The test-mode marker could not be written.
    TestMutation,
}

/// Why a run stopped early. The display text is what gets notified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Abort {
    #[error("could not determine current branch - {reason}")]
    BranchUnknown { reason: String },

    #[error("user declined branch switch to {required}")]
    BranchSwitchDeclined { required: String },

    #[error("could not switch to {required} branch - {reason}")]
    BranchSwitchFailed { required: String, reason: String },

    #[error("failed to switch to {required} branch (still on {current})")]
    BranchStillMismatched { required: String, current: String },

    #[error("failed to pull latest changes - {0}")]
    Pull(String),

    #[error("could not modify test file - {0}")]
    TestMarker(String),
}

impl Abort {
    pub fn kind(&self) -> AbortKind {
        match self {
            Self::BranchUnknown { .. }
            | Self::BranchSwitchDeclined { .. }
            | Self::BranchSwitchFailed { .. }
            | Self::BranchStillMismatched { .. } => AbortKind::Gate,
            Self::Pull(_) => AbortKind::Pull,
            Self::TestMarker(_) => AbortKind::TestMutation,
        }
    }
}
