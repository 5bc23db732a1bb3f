//! Run configuration.
//!
//! Every value is resolved once at startup through a chain:
//!
//! 1. Environment variables (what the operator's env file exports)
//! 2. `~/.report-sync/config.toml`, an optional fallback
//!
//! Source and destination keys are platform-dependent so one env file can
//! serve both a Windows and a macOS/Linux machine.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{marker::DEFAULT_MARKER_FILE, mirror::MirrorRule};

pub const SOURCE_VAR: &str = if cfg!(windows) {
    "REPORT_SYNC_WIN_SOURCE"
} else {
    "REPORT_SYNC_MAC_SOURCE"
};

pub const DEST_VAR: &str = if cfg!(windows) {
    "REPORT_SYNC_WIN_DEST"
} else {
    "REPORT_SYNC_MAC_DEST"
};

pub const WEBHOOK_VAR: &str = "REPORT_SYNC_SLACK_WEBHOOK";
pub const TEAM_WEBHOOK_VAR: &str = "REPORT_SYNC_SLACK_WEBHOOK_TEAM";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{what} is not set: export {var} or set `{key}` in {}", file_hint())]
    Missing {
        what: &'static str,
        var: &'static str,
        key: &'static str,
    },

    #[error("destination {} has no parent directory to use as the repository", .0.display())]
    NoRepository(PathBuf),

    #[error("could not resolve {} to an absolute path: {source}", .path.display())]
    Absolute {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

fn file_hint() -> String {
    FileConfig::path().map_or_else(
        || "~/.report-sync/config.toml".to_string(),
        |p| p.display().to_string(),
    )
}

/// Optional on-disk settings. Every key may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub slack_webhook: Option<String>,
    pub team_slack_webhook: Option<String>,
    pub test_marker_file: Option<String>,
}

impl FileConfig {
    /// Load `~/.report-sync/config.toml`. A missing file is an empty config.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The config file path: `~/.report-sync/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".report-sync").join("config.toml"))
    }
}

/// Resolved, read-only settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    /// Always the parent of `destination_root`.
    pub repo_path: PathBuf,
    pub test_mode: bool,
    /// Also notify the team webhook (ignored in test mode).
    pub notify_team: bool,
    pub slack_webhook: Option<String>,
    pub team_slack_webhook: Option<String>,
    /// Report that receives the test-mode marker.
    pub marker_file: String,
    pub rules: Vec<MirrorRule>,
}

impl Config {
    /// Resolve from the process environment and the config file.
    pub fn resolve(test_mode: bool, notify_team: bool) -> Result<Self, ConfigError> {
        let file = FileConfig::load()?;
        Self::from_sources(|key| env::var(key).ok(), file, test_mode, notify_team)
    }

    /// Resolve from an explicit variable lookup and file config.
    ///
    /// Non-empty variables win over file values. Relative roots are
    /// resolved against the current directory.
    pub fn from_sources(
        lookup: impl Fn(&str) -> Option<String>,
        file: FileConfig,
        test_mode: bool,
        notify_team: bool,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source_root = var(SOURCE_VAR)
            .map(PathBuf::from)
            .or(file.source)
            .ok_or(ConfigError::Missing {
                what: "source path",
                var: SOURCE_VAR,
                key: "source",
            })
            .and_then(absolute)?;

        let destination_root = var(DEST_VAR)
            .map(PathBuf::from)
            .or(file.destination)
            .ok_or(ConfigError::Missing {
                what: "destination path",
                var: DEST_VAR,
                key: "destination",
            })
            .and_then(absolute)?;

        let repo_path = destination_root
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::NoRepository(destination_root.clone()))?
            .to_path_buf();

        Ok(Self {
            source_root,
            destination_root,
            repo_path,
            test_mode,
            notify_team,
            slack_webhook: var(WEBHOOK_VAR).or(file.slack_webhook),
            team_slack_webhook: var(TEAM_WEBHOOK_VAR).or(file.team_slack_webhook),
            marker_file: file
                .test_marker_file
                .unwrap_or_else(|| DEFAULT_MARKER_FILE.to_string()),
            rules: MirrorRule::defaults(),
        })
    }

    /// Branch the destination repository must be on for this run.
    pub fn required_branch(&self) -> &'static str {
        if self.test_mode { "test" } else { "develop" }
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf, ConfigError> {
    std::path::absolute(&path).map_err(|source| ConfigError::Absolute { path, source })
}
