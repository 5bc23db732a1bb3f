//! Repository access: the git operations the sync workflow drives.
//!
//! [`Repository`] is the seam the workflow depends on. [`GitRepo`] implements
//! it by shelling out to `git`, always with the repository path passed as the
//! child's working directory. The process's own working directory is never
//! changed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::model::{ChangeRecord, parse_status};

/// Errors from running git.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] io::Error),

    #[error("git {args} failed: {stderr}")]
    Failed { args: String, stderr: String },

    #[error("{} is not a git repository", .0.display())]
    NotARepository(PathBuf),
}

pub type Result<T> = core::result::Result<T, GitError>;

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// A commit was recorded with this message.
    Created { message: String },
    /// Nothing under the committed paths was staged.
    NothingToCommit,
}

/// The repository operations the sync workflow consumes.
///
/// Every operation targets one repository. Success messages are meant for
/// the operator; failures carry git's stderr.
pub trait Repository {
    fn current_branch(&self) -> Result<String>;

    fn branch_exists(&self, branch: &str) -> Result<bool>;

    /// Changed paths, one record per porcelain status line.
    fn status(&self) -> Result<Vec<ChangeRecord>>;

    fn pull(&self) -> Result<String>;

    fn checkout(&self, branch: &str) -> Result<String>;

    fn create_branch(&self, branch: &str) -> Result<String>;

    /// Stage `paths` and commit them with `message`.
    fn commit(&self, paths: &[&Path], message: &str) -> Result<Commit>;

    fn push(&self, branch: &str) -> Result<String>;
}

/// A working tree on disk, driven through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Run git in the repository and return stdout on success.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;

        if !output.status.success() {
            return Err(failure(args, &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(repo = %self.path.display(), "git {}", args.join(" "));
        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()?)
    }

    fn ensure_work_tree(&self) -> Result<()> {
        if !self.path.is_dir() {
            return Err(GitError::NotARepository(self.path.clone()));
        }
        match self.run(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(out) if out.trim() == "true" => Ok(()),
            Ok(_) | Err(GitError::Failed { .. }) => {
                Err(GitError::NotARepository(self.path.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Path to hand to git for `path`: relative to the repository when it
    /// lies inside it, unchanged otherwise.
    fn pathspec(&self, path: &Path) -> String {
        match path.strip_prefix(&self.path) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Error for a failed git command. Some commands explain themselves on
/// stdout only, so that is used when stderr is empty.
fn failure(args: &[&str], output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stderr = if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    };
    GitError::Failed {
        args: args.join(" "),
        stderr,
    }
}

impl Repository for GitRepo {
    fn current_branch(&self) -> Result<String> {
        self.ensure_work_tree()?;
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    fn branch_exists(&self, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self.output(&["show-ref", "--verify", "--quiet", &reference])?;
        Ok(output.status.success())
    }

    fn status(&self) -> Result<Vec<ChangeRecord>> {
        self.ensure_work_tree()?;
        let out = self.run(&["status", "--porcelain"])?;
        Ok(parse_status(&out))
    }

    fn pull(&self) -> Result<String> {
        self.run(&["pull"])?;
        Ok("Successfully pulled latest changes".to_string())
    }

    fn checkout(&self, branch: &str) -> Result<String> {
        self.run(&["checkout", branch])?;
        Ok(format!("Successfully switched to branch '{branch}'"))
    }

    fn create_branch(&self, branch: &str) -> Result<String> {
        self.run(&["branch", branch])?;
        Ok(format!("Successfully created branch '{branch}'"))
    }

    fn commit(&self, paths: &[&Path], message: &str) -> Result<Commit> {
        let specs: Vec<String> = paths.iter().map(|p| self.pathspec(p)).collect();

        let mut add = vec!["add", "--all", "--"];
        add.extend(specs.iter().map(String::as_str));
        self.run(&add)?;

        // Status covers the whole work tree, staging only `paths`. Files
        // changed elsewhere can leave nothing staged here.
        let mut diff = vec!["diff", "--cached", "--quiet", "--"];
        diff.extend(specs.iter().map(String::as_str));
        let staged = self.output(&diff)?;
        match staged.status.code() {
            Some(0) => return Ok(Commit::NothingToCommit),
            Some(1) => {}
            _ => return Err(failure(&diff, &staged)),
        }

        self.run(&["commit", "-m", message])?;
        Ok(Commit::Created {
            message: message.to_string(),
        })
    }

    fn push(&self, branch: &str) -> Result<String> {
        self.run(&["push", "origin", branch])?;
        Ok(format!("Successfully pushed changes to origin/{branch}"))
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::testing::{clone_with_origin, git};
    use super::*;

    #[test]
    fn reads_current_branch() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let repo = GitRepo::new(&work);

        assert_eq!(repo.current_branch().unwrap(), "develop");
    }

    #[test]
    fn current_branch_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let repo = GitRepo::new(dir.path().join("missing"));

        let err = repo.current_branch().unwrap_err();
        assert!(matches!(err, GitError::NotARepository(_)));
    }

    #[test]
    fn status_reports_untracked_and_modified() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        fs::write(work.join("README.md"), "changed\n").unwrap();
        fs::write(work.join("New.mrt"), "<report/>").unwrap();

        let repo = GitRepo::new(&work);
        let status = repo.status().unwrap();

        assert!(status.contains(&ChangeRecord::new("M", "README.md")));
        assert!(status.contains(&ChangeRecord::new("??", "New.mrt")));
    }

    #[test]
    fn branch_create_exists_and_checkout() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let repo = GitRepo::new(&work);

        assert!(!repo.branch_exists("test").unwrap());
        repo.create_branch("test").unwrap();
        assert!(repo.branch_exists("test").unwrap());

        repo.checkout("test").unwrap();
        assert_eq!(repo.current_branch().unwrap(), "test");
    }

    #[test]
    fn checkout_unknown_branch_fails() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let repo = GitRepo::new(&work);

        let err = repo.checkout("nope").unwrap_err();
        assert!(matches!(err, GitError::Failed { .. }));
    }

    #[test]
    fn commit_then_nothing_to_commit() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let reports = work.join("Reports");
        fs::create_dir_all(&reports).unwrap();
        fs::write(reports.join("A.mrt"), "<a/>").unwrap();
        let repo = GitRepo::new(&work);

        let first = repo
            .commit(&[reports.as_path()], "Updated reports (1)")
            .unwrap();
        assert_eq!(
            first,
            Commit::Created {
                message: "Updated reports (1)".to_string()
            }
        );
        assert_eq!(git(&work, &["log", "-1", "--format=%s"]), "Updated reports (1)");

        let second = repo
            .commit(&[reports.as_path()], "Updated reports (0)")
            .unwrap();
        assert_eq!(second, Commit::NothingToCommit);
    }

    #[test]
    fn changes_outside_committed_paths_are_nothing_to_commit() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let reports = work.join("Reports");
        fs::create_dir_all(&reports).unwrap();
        fs::write(reports.join("A.mrt"), "<a/>").unwrap();
        let repo = GitRepo::new(&work);
        repo.commit(&[reports.as_path()], "Updated reports (1)")
            .unwrap();
        let head = git(&work, &["rev-parse", "HEAD"]);

        fs::write(work.join("notes.txt"), "scratch").unwrap();
        fs::write(work.join("README.md"), "edited\n").unwrap();
        assert!(!repo.status().unwrap().is_empty());

        let outcome = repo
            .commit(&[reports.as_path()], "Updated reports (2)")
            .unwrap();
        assert_eq!(outcome, Commit::NothingToCommit);
        assert_eq!(git(&work, &["rev-parse", "HEAD"]), head);
    }

    #[test]
    fn pathspec_is_relative_to_repository() {
        let repo = GitRepo::new("work");
        assert_eq!(repo.pathspec(Path::new("work/Reports")), "Reports");
        assert_eq!(repo.pathspec(Path::new("work")), ".");
        assert_eq!(
            repo.pathspec(Path::new("elsewhere/Reports")),
            "elsewhere/Reports"
        );

        let repo = GitRepo::new("/srv/cloud_reports");
        assert_eq!(
            repo.pathspec(Path::new("/srv/cloud_reports/Reports")),
            "Reports"
        );
    }

    #[test]
    fn failure_without_stderr_reports_stdout() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let repo = GitRepo::new(&work);

        let err = repo.run(&["commit", "-m", "empty"]).unwrap_err();
        let GitError::Failed { args, stderr } = err else {
            panic!("expected a failed git command");
        };
        assert_eq!(args, "commit -m empty");
        assert!(stderr.contains("nothing to commit"), "{stderr}");
    }

    #[test]
    fn pull_and_push_round_trip_through_origin() {
        let dir = TempDir::new().unwrap();
        let work = clone_with_origin(dir.path(), "develop");
        let repo = GitRepo::new(&work);

        repo.pull().unwrap();

        fs::write(work.join("B.mrt"), "<b/>").unwrap();
        repo.commit(&[work.join("B.mrt").as_path()], "add b")
            .unwrap();
        repo.push("develop").unwrap();

        let local = git(&work, &["rev-parse", "HEAD"]);
        let remote = git(&dir.path().join("origin.git"), &["rev-parse", "develop"]);
        assert_eq!(local, remote);
    }

    #[test]
    fn pull_without_remote_fails_with_stderr() {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "--quiet"]);
        let repo = GitRepo::new(dir.path());

        let err = repo.pull().unwrap_err();
        let GitError::Failed { args, .. } = err else {
            panic!("expected a failed git command");
        };
        assert_eq!(args, "pull");
    }
}
