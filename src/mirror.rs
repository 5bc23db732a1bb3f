//! Mirror: wholesale delete-and-recopy of the destination tree.
//!
//! What gets copied is described by a list of [`MirrorRule`]s, each mapping
//! a source subtree to a destination subtree. Only report files (`.mrt`)
//! are copied. Hidden files and directories are skipped.
//!
//! Two layouts exist:
//!
//! - [`Layout::Categorized`]: each first-level folder under the source is a
//!   category and is kept; anything deeper is flattened into its category.
//!   Files sitting directly in the source root belong to no category and are
//!   not copied.
//! - [`Layout::Flat`]: every report file in the subtree lands directly in
//!   the destination folder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Extension of the files that are mirrored.
pub const REPORT_EXTENSION: &str = "mrt";

/// Errors that can occur while mirroring.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("source folder not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = core::result::Result<T, MirrorError>;

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> MirrorError + '_ {
    move |source| MirrorError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// How a source subtree is laid out in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Keep one level of category folders.
    Categorized,
    /// Drop all folder structure.
    Flat,
}

/// One source subtree mirrored to one destination subtree.
///
/// Both paths are relative to their respective roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRule {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub layout: Layout,
}

impl MirrorRule {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        layout: Layout,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            layout,
        }
    }

    /// The standard report and dashboard trees for user and support reports.
    pub fn defaults() -> Vec<Self> {
        ["User", "Support"]
            .into_iter()
            .flat_map(|area| {
                let reports = Path::new(area).join("Reports");
                let dashboards = Path::new(area).join("Dashboards");
                [
                    Self::new(&reports, &reports, Layout::Categorized),
                    Self::new(&dashboards, &dashboards, Layout::Flat),
                ]
            })
            .collect()
    }
}

/// One file copied during a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Replace `dest_root` with a fresh copy of `source_root` according to `rules`.
///
/// Every categorized source is checked before anything is deleted, so a
/// missing one leaves the existing destination untouched. A missing flat
/// source yields an empty destination folder. After the delete there is no
/// partial-success handling: an error part-way leaves a partially populated
/// destination, which the next successful run replaces.
pub fn mirror(
    source_root: &Path,
    dest_root: &Path,
    rules: &[MirrorRule],
) -> Result<Vec<CopiedFile>> {
    for rule in rules {
        let source = source_root.join(&rule.source);
        if rule.layout == Layout::Categorized && !source.is_dir() {
            return Err(MirrorError::MissingSource(source));
        }
    }

    if dest_root.exists() {
        fs::remove_dir_all(dest_root).map_err(io_err(dest_root))?;
        tracing::info!(path = %dest_root.display(), "deleted existing destination");
    }
    fs::create_dir_all(dest_root).map_err(io_err(dest_root))?;

    let mut copied = Vec::new();
    for rule in rules {
        let source = source_root.join(&rule.source);
        let destination = dest_root.join(&rule.destination);
        let files = match rule.layout {
            Layout::Categorized => copy_categorized(&source, &destination)?,
            Layout::Flat if !source.exists() => {
                tracing::warn!(
                    source = %source.display(),
                    "source folder missing, leaving it empty"
                );
                fs::create_dir_all(&destination).map_err(io_err(&destination))?;
                Vec::new()
            }
            Layout::Flat => copy_flat(&source, &destination)?,
        };
        tracing::debug!(
            source = %source.display(),
            files = files.len(),
            "mirrored rule"
        );
        copied.extend(files);
    }

    Ok(copied)
}

/// Copy each first-level category folder of `source` with [`copy_flat`].
pub fn copy_categorized(source: &Path, destination: &Path) -> Result<Vec<CopiedFile>> {
    let mut categories = Vec::new();
    for entry in fs::read_dir(source).map_err(io_err(source))? {
        let entry = entry.map_err(io_err(source))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err(&path))?;
        let is_dir = if file_type.is_symlink() {
            path.is_dir()
        } else {
            file_type.is_dir()
        };
        if is_dir && !is_hidden(&path) {
            categories.push(path);
        }
    }
    categories.sort();

    let mut copied = Vec::new();
    for category in categories {
        let Some(name) = category.file_name() else {
            continue;
        };
        copied.extend(copy_flat(&category, &destination.join(name))?);
    }
    Ok(copied)
}

/// Copy every report file under `source`, at any depth, directly into `destination`.
///
/// The destination folder is created even when there is nothing to copy.
/// Files with the same name overwrite each other in walk order.
pub fn copy_flat(source: &Path, destination: &Path) -> Result<Vec<CopiedFile>> {
    fs::create_dir_all(destination).map_err(io_err(destination))?;

    let walker = WalkBuilder::new(source)
        .standard_filters(false)
        .hidden(true)
        .sort_by_file_name(Ord::cmp)
        .build();

    let mut copied = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source_err| MirrorError::Walk {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !is_report(path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };

        let target = destination.join(name);
        fs::copy(path, &target).map_err(io_err(path))?;
        copied.push(CopiedFile {
            from: path.to_path_buf(),
            to: target,
        });
    }
    Ok(copied)
}

fn is_report(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn run(source: &Path, dest_root: &Path) -> Result<Vec<CopiedFile>> {
        mirror(source, dest_root, &MirrorRule::defaults())
    }

    fn setup_source() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "User/Reports/Sales/Weekly.mrt", "weekly");
        write(root, "User/Reports/Sales/Archive/Old.mrt", "old");
        write(root, "User/Reports/Loose.mrt", "no category");
        write(root, "User/Reports/Sales/notes.txt", "not a report");
        write(root, "User/Dashboards/x/Overview.mrt", "overview");
        write(root, "Support/Reports/Billing/Invoice.mrt", "invoice");
        write(root, "Support/Reports/.hidden/Secret.mrt", "hidden");
        write(root, "Support/Dashboards/Health.mrt", "health");
        dir
    }

    #[test]
    fn default_rules_cover_both_areas() {
        let rules = MirrorRule::defaults();
        assert_eq!(rules.len(), 4);
        assert_eq!(
            rules[0],
            MirrorRule::new("User/Reports", "User/Reports", Layout::Categorized)
        );
        assert_eq!(
            rules[3],
            MirrorRule::new("Support/Dashboards", "Support/Dashboards", Layout::Flat)
        );
    }

    #[test]
    fn categorized_keeps_category_folder() {
        let source = setup_source();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        run(source.path(), &dest_root).unwrap();

        let invoice = dest_root.join("Support/Reports/Billing/Invoice.mrt");
        assert_eq!(fs::read_to_string(invoice).unwrap(), "invoice");
    }

    #[test]
    fn flat_drops_subfolders() {
        let source = setup_source();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        run(source.path(), &dest_root).unwrap();

        assert!(dest_root.join("User/Dashboards/Overview.mrt").is_file());
        assert!(!dest_root.join("User/Dashboards/x").exists());
    }

    #[test]
    fn nested_files_flatten_into_category() {
        let source = setup_source();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        run(source.path(), &dest_root).unwrap();

        assert!(dest_root.join("User/Reports/Sales/Old.mrt").is_file());
        assert!(!dest_root.join("User/Reports/Sales/Archive").exists());
    }

    #[test]
    fn skips_uncategorized_hidden_and_non_report_files() {
        let source = setup_source();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        let copied = run(source.path(), &dest_root).unwrap();

        assert!(!dest_root.join("User/Reports/Loose.mrt").exists());
        assert!(!dest_root.join("User/Reports/Sales/notes.txt").exists());
        assert!(!dest_root.join("Support/Reports/.hidden").exists());
        assert_eq!(copied.len(), 5);
    }

    #[test]
    fn replaces_existing_destination() {
        let source = setup_source();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");
        write(&dest_root, "User/Reports/Gone/Stale.mrt", "stale");

        run(source.path(), &dest_root).unwrap();

        assert!(!dest_root.join("User/Reports/Gone").exists());
        assert!(dest_root.join("User/Reports/Sales/Weekly.mrt").is_file());
    }

    #[test]
    fn missing_source_leaves_destination_untouched() {
        let source = TempDir::new().unwrap();
        write(source.path(), "User/Reports/Sales/Weekly.mrt", "weekly");
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");
        write(&dest_root, "User/Reports/Sales/Weekly.mrt", "previous");

        let err = run(source.path(), &dest_root).unwrap_err();

        assert!(matches!(err, MirrorError::MissingSource(_)));
        assert_eq!(
            fs::read_to_string(dest_root.join("User/Reports/Sales/Weekly.mrt")).unwrap(),
            "previous"
        );
    }

    #[test]
    fn missing_flat_source_leaves_empty_folder() {
        let source = setup_source();
        fs::remove_dir_all(source.path().join("Support/Dashboards")).unwrap();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        let copied = run(source.path(), &dest_root).unwrap();

        let dashboards = dest_root.join("Support/Dashboards");
        assert!(dashboards.is_dir());
        assert_eq!(fs::read_dir(dashboards).unwrap().count(), 0);
        assert_eq!(copied.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_category_fails_the_mirror() {
        use std::os::unix::fs::PermissionsExt;

        let source = setup_source();
        let billing = source.path().join("Support/Reports/Billing");
        fs::set_permissions(&billing, fs::Permissions::from_mode(0o000)).unwrap();
        let readable = fs::read_dir(&billing).is_ok();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        let result = run(source.path(), &dest_root);
        fs::set_permissions(&billing, fs::Permissions::from_mode(0o755)).unwrap();

        // Permission bits do not apply to root.
        if readable {
            return;
        }
        assert!(result.is_err(), "mirror reported success: {result:?}");
    }

    #[test]
    fn mirroring_twice_converges() {
        let source = setup_source();
        let dest = TempDir::new().unwrap();
        let dest_root = dest.path().join("Reports");

        let first = run(source.path(), &dest_root).unwrap();
        let second = run(source.path(), &dest_root).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn report_extension_is_case_insensitive() {
        assert!(is_report(Path::new("A.MRT")));
        assert!(is_report(Path::new("dir/b.mrt")));
        assert!(!is_report(Path::new("c.mrt.bak")));
    }
}
