//! The sync workflow: branch gate, pull, mirror, detect, commit, push.
//!
//! Each step either hands over to the next or ends the run with an
//! [`Outcome`]. Gate, pull and test-marker failures abort and notify.
//! Mirror and unexpected repository failures propagate as
//! [`WorkflowError`]. Nothing is rolled back: a rerun performs the same
//! delete-and-recopy and converges on a consistent tree.

use crate::{
    config::Config,
    git::{Commit, GitError, Repository},
    marker::append_marker,
    mirror::{MirrorError, mirror},
    model::{Abort, ChangeRecord, Outcome, commit_message},
    notify::{Notifier, deployed_message},
};

/// Failures the workflow does not try to handle.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("mirror failed: {0}")]
    Mirror(#[from] MirrorError),

    #[error("repository error: {0}")]
    Git(#[from] GitError),
}

/// One sync run against one repository.
///
/// `confirm` answers operator prompts; pass [`crate::prompt::confirm`] for
/// interactive use.
pub struct SyncWorkflow<'a, C> {
    config: &'a Config,
    repo: &'a dyn Repository,
    notifier: &'a dyn Notifier,
    confirm: C,
}

impl<'a, C> SyncWorkflow<'a, C>
where
    C: FnMut(&str) -> bool,
{
    pub fn new(
        config: &'a Config,
        repo: &'a dyn Repository,
        notifier: &'a dyn Notifier,
        confirm: C,
    ) -> Self {
        Self {
            config,
            repo,
            notifier,
            confirm,
        }
    }

    pub fn run(&mut self) -> Result<Outcome, WorkflowError> {
        let config = self.config;
        tracing::info!(
            source = %config.source_root.display(),
            destination = %config.destination_root.display(),
            test_mode = config.test_mode,
            "starting report sync"
        );

        if let Err(abort) = self.branch_gate(config.required_branch()) {
            return Ok(self.abort(abort));
        }

        println!("Pulling latest changes from remote...");
        match self.repo.pull() {
            Ok(message) => println!("{message}"),
            Err(e) => return Ok(self.abort(Abort::Pull(e.to_string()))),
        }

        let copied = mirror(&config.source_root, &config.destination_root, &config.rules)?;
        for file in &copied {
            println!("Copied: {} -> {}", file.from.display(), file.to.display());
        }
        tracing::info!(files = copied.len(), "mirror complete");

        if config.test_mode {
            println!("\nRunning in TEST MODE - will modify a destination file");
            match append_marker(&config.destination_root, &config.marker_file) {
                Ok(path) => println!("Modified destination file {}", path.display()),
                Err(e) => return Ok(self.abort(Abort::TestMarker(e.to_string()))),
            }
        }

        println!("\nChecking Git changes in the repository...");
        let changes = self.repo.status()?;
        if changes.is_empty() {
            let message = if config.test_mode {
                "Test result: No changes detected in the Git repository."
            } else {
                "No changes detected."
            };
            println!("\n{message}");
            self.notifier.notify(message);
            return Ok(Outcome::NoChanges);
        }

        println!("\nThe following files have changed:\n");
        print_changes(&changes, "");

        let message = commit_message(&changes);
        match self
            .repo
            .commit(&[config.destination_root.as_path()], &message)?
        {
            Commit::NothingToCommit => {
                // Status covers the whole work tree, the commit only the destination.
                tracing::warn!(
                    changes = changes.len(),
                    "status reported changes but commit found none"
                );
                println!("\nNothing to commit");
                return Ok(Outcome::NothingToCommit);
            }
            Commit::Created { message } => {
                println!("\nChanges committed with message: '{message}'");
            }
        }

        self.push_gate(&changes)
    }

    /// Make sure the repository is on `required`, offering to switch.
    fn branch_gate(&mut self, required: &str) -> Result<(), Abort> {
        let unknown = |e: GitError| Abort::BranchUnknown {
            reason: e.to_string(),
        };
        let current = self.repo.current_branch().map_err(unknown)?;

        if current.eq_ignore_ascii_case(required) {
            println!("Git repository is on the correct branch: {current}");
            return Ok(());
        }

        println!(
            "WARNING: Git repository is not on the '{required}' branch. Current branch: '{current}'"
        );

        if self.config.test_mode {
            self.ensure_branch(required);
        }

        if !(self.confirm)(&format!("Do you want to switch to the '{required}' branch?")) {
            return Err(Abort::BranchSwitchDeclined {
                required: required.to_string(),
            });
        }

        let failed = |reason: String| Abort::BranchSwitchFailed {
            required: required.to_string(),
            reason,
        };

        println!("Attempting to switch to {required} branch...");
        match self.repo.branch_exists(required) {
            Ok(true) => {}
            Ok(false) => {
                return Err(failed(format!(
                    "branch '{required}' does not exist in the repository"
                )));
            }
            Err(e) => return Err(failed(e.to_string())),
        }
        match self.repo.status() {
            Ok(changes) if changes.is_empty() => {}
            Ok(_) => {
                return Err(failed(
                    "you have uncommitted changes in your repository".to_string(),
                ));
            }
            Err(e) => return Err(failed(e.to_string())),
        }

        let message = self
            .repo
            .checkout(required)
            .map_err(|e| failed(e.to_string()))?;
        println!("{message}");

        let current = self.repo.current_branch().map_err(unknown)?;
        if !current.eq_ignore_ascii_case(required) {
            return Err(Abort::BranchStillMismatched {
                required: required.to_string(),
                current,
            });
        }
        Ok(())
    }

    /// Create `branch` if missing. Failures are reported and left for the
    /// switch step to trip over.
    fn ensure_branch(&self, branch: &str) {
        println!("Checking if '{branch}' branch exists...");
        match self.repo.branch_exists(branch) {
            Ok(true) => println!("Branch '{branch}' already exists"),
            Ok(false) => match self.repo.create_branch(branch) {
                Ok(message) => println!("{message}"),
                Err(e) => println!("Failed to create branch '{branch}': {e}"),
            },
            Err(e) => println!("Could not check for branch '{branch}': {e}"),
        }
    }

    /// Ask before pushing the commit just made.
    fn push_gate(&mut self, changes: &[ChangeRecord]) -> Result<Outcome, WorkflowError> {
        println!("\nThe following files will be pushed to the remote repository:\n");
        print_changes(changes, "  ");

        let branch = self.repo.current_branch()?;
        if !(self.confirm)(&format!("Do you want to push these changes to {branch}?")) {
            println!("Changes were committed but not pushed as requested.");
            println!("You can push the changes manually later if needed.");
            return Ok(Outcome::CommittedNotPushed {
                branch,
                push_error: None,
            });
        }

        println!("Pushing changes to {branch}. This may take a moment...");
        match self.repo.push(&branch) {
            Ok(message) => {
                println!("{message}");
                self.notifier.notify(&deployed_message(changes));
                if self.config.test_mode {
                    println!("\nTest successful! Changes pushed to {branch}.");
                } else {
                    println!("\nReport deployment completed successfully to {branch}!");
                }
                Ok(Outcome::CommittedAndPushed {
                    branch,
                    changes: changes.len(),
                })
            }
            Err(e) => {
                tracing::warn!(%branch, "push failed: {e}");
                println!("{e}");
                println!("Changes were committed but not pushed. Please push manually.");
                Ok(Outcome::CommittedNotPushed {
                    branch,
                    push_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Report an abort to the operator and the notifier.
    fn abort(&self, abort: Abort) -> Outcome {
        tracing::warn!(kind = ?abort.kind(), "{abort}");
        println!("Aborting: {abort}");
        self.notifier
            .notify(&format!("Report deployment aborted: {abort}"));
        Outcome::Aborted(abort)
    }
}

fn print_changes(changes: &[ChangeRecord], indent: &str) {
    for change in changes {
        println!("{indent}{change}");
    }
    println!();
}
