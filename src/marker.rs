//! Test-mode marker: a guaranteed change in the mirrored tree.
//!
//! In test mode the workflow appends a timestamped comment line to a
//! well-known report so change detection always has something to find.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use jiff::Zoned;

/// Default name of the report the marker is appended to.
pub const DEFAULT_MARKER_FILE: &str = "StockTake.mrt";

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("{name} file not found in {}", .root.display())]
    NotFound { name: String, root: PathBuf },

    #[error("failed to search {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("error modifying {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Append a marker line to the first file named `file_name` under `root`.
///
/// Returns the modified path. Search order is by file name at each level,
/// so the choice is stable across runs.
pub fn append_marker(root: &Path, file_name: &str) -> Result<PathBuf, MarkerError> {
    let target = find_file(root, file_name)?.ok_or_else(|| MarkerError::NotFound {
        name: file_name.to_string(),
        root: root.to_path_buf(),
    })?;

    let timestamp = Zoned::now().strftime("%Y%m%d%H%M%S").to_string();
    let io_err = |source| MarkerError::Io {
        path: target.clone(),
        source,
    };

    let content = fs::read_to_string(&target).map_err(io_err)?;
    fs::write(&target, with_marker(&content, &timestamp)).map_err(io_err)?;

    tracing::info!(path = %target.display(), "appended test marker");
    Ok(target)
}

/// `content` with a marker line appended, keeping its line-ending convention.
///
/// An unterminated last line is terminated first.
fn with_marker(content: &str, timestamp: &str) -> String {
    let line_ending = if content.contains("\r\n") { "\r\n" } else { "\n" };

    let mut out = String::with_capacity(content.len() + 48);
    out.push_str(content);
    if !content.ends_with(line_ending) {
        out.push_str(line_ending);
    }
    out.push_str("<!-- Test change ");
    out.push_str(timestamp);
    out.push_str(" -->");
    out.push_str(line_ending);
    out
}

fn find_file(root: &Path, file_name: &str) -> Result<Option<PathBuf>, MarkerError> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(Ord::cmp)
        .build();

    for entry in walker {
        let entry = entry.map_err(|source| MarkerError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_some_and(|ft| ft.is_file()) && entry.file_name() == file_name {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}
