// src/ops/mod.rs

//! Cross-package operation engine.
//!
//! Each operation takes the full set of requested packages, runs the
//! per-package work (parallel where the work is network-bound), and
//! aggregates the results into a report instead of aborting on the
//! first failure. Shared-state steps, like writing the manifest or the
//! lock file, stay sequential and run only after every package has
//! reached a terminal state.

mod generate;
mod install;
mod lock;
mod outdated;
mod prune;
mod remove;

pub use generate::generate;
pub use install::{install, InstallOptions};
pub use lock::lock;
pub use outdated::{outdated, OutdatedEntry, OutdatedOptions, OutdatedStatus};
pub use prune::prune;
pub use remove::{remove, RemoveOptions};

use crate::fetch::FetchAction;

/// Default number of concurrent fetch workers.
pub const DEFAULT_JOBS: usize = 4;

/// Terminal state of a single package within an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    /// The package sits at its target revision in the vendor tree.
    Installed {
        revision: String,
        action: FetchAction,
    },
    /// The package was removed from the vendor tree. `existed` is false
    /// when there was nothing to remove, which is still a success.
    Removed { existed: bool },
    /// The package could not be processed. The rest of the operation
    /// carried on without it.
    Failed { error: String },
}

/// One package's outcome, in the order the operation processed it.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    pub import_path: String,
    pub status: PackageStatus,
}

impl PackageOutcome {
    pub fn failed(&self) -> bool {
        matches!(self.status, PackageStatus::Failed { .. })
    }
}

/// Aggregated result of one operation across all requested packages.
#[derive(Debug, Default)]
pub struct OperationReport {
    outcomes: Vec<PackageOutcome>,
}

impl OperationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, import_path: impl Into<String>, status: PackageStatus) {
        self.outcomes.push(PackageOutcome {
            import_path: import_path.into(),
            status,
        });
    }

    pub fn outcomes(&self) -> &[PackageOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Count of packages whose vendor tree contents actually changed.
    pub fn changed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| match &o.status {
                PackageStatus::Installed { action, .. } => *action != FetchAction::Unchanged,
                PackageStatus::Removed { existed } => *existed,
                PackageStatus::Failed { .. } => false,
            })
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| o.failed())
    }
}

/// Removes `dir` and then walks back up toward `stop`, deleting parent
/// directories that the removal left empty. `stop` itself is never
/// deleted.
pub(crate) fn remove_entry_and_empty_parents(dir: &std::path::Path, stop: &std::path::Path) -> std::io::Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(dir)?;

    let mut current = dir.parent();
    while let Some(parent) = current {
        if parent == stop || !parent.starts_with(stop) {
            break;
        }
        match std::fs::read_dir(parent) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    break;
                }
            }
            Err(_) => break,
        }
        std::fs::remove_dir(parent)?;
        current = parent.parent();
    }

    Ok(true)
}

/// Walks the vendor source tree and returns the import path of every
/// checkout found, in sorted order. A checkout's own subdirectories are
/// not descended into, so nested repository layouts cannot produce
/// phantom entries.
pub(crate) fn scan_checkouts(src_dir: &std::path::Path) -> Result<Vec<String>, walkdir::Error> {
    use walkdir::WalkDir;

    let mut found = Vec::new();
    if !src_dir.exists() {
        return Ok(found);
    }

    let mut walker = WalkDir::new(src_dir).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if crate::fetch::is_checkout(entry.path()) {
            let rel = entry
                .path()
                .strip_prefix(src_dir)
                .expect("walked entries live under the source root");
            found.push(rel.to_string_lossy().into_owned());
            walker.skip_current_dir();
        }
    }

    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_report_counters() {
        let mut report = OperationReport::new();
        report.push(
            "github.com/a/b",
            PackageStatus::Installed {
                revision: "abc1234".into(),
                action: FetchAction::Cloned,
            },
        );
        report.push(
            "github.com/c/d",
            PackageStatus::Installed {
                revision: "abc1234".into(),
                action: FetchAction::Unchanged,
            },
        );
        report.push(
            "github.com/e/f",
            PackageStatus::Failed {
                error: "boom".into(),
            },
        );

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.changed(), 1);
        assert!(!report.is_success());
        assert_eq!(
            report.failures().map(|o| o.import_path.as_str()).collect::<Vec<_>>(),
            vec!["github.com/e/f"]
        );
    }

    #[test]
    fn test_remove_entry_cleans_empty_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let repo = src.join("github.com/alice/widget");
        fs::create_dir_all(&repo).unwrap();
        fs::write(repo.join("main.go"), "package main\n").unwrap();

        let removed = remove_entry_and_empty_parents(&repo, &src).unwrap();
        assert!(removed);
        assert!(!src.join("github.com").exists());
        assert!(src.exists());
    }

    #[test]
    fn test_remove_entry_keeps_shared_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("github.com/alice/widget")).unwrap();
        fs::create_dir_all(src.join("github.com/alice/gadget")).unwrap();

        remove_entry_and_empty_parents(&src.join("github.com/alice/widget"), &src).unwrap();
        assert!(src.join("github.com/alice/gadget").exists());
        assert!(src.join("github.com/alice").exists());
    }

    #[test]
    fn test_remove_entry_absent_is_noop() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let removed =
            remove_entry_and_empty_parents(&src.join("github.com/alice/widget"), &src).unwrap();
        assert!(!removed);
    }

    #[test]
    fn test_scan_checkouts_finds_nested_entries() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path();
        for path in [
            "github.com/alice/widget",
            "github.com/bob/gadget",
            "gopkg.in/yaml.v2",
        ] {
            let dir = src.join(path).join(".git");
            fs::create_dir_all(&dir).unwrap();
        }
        // A plain directory without a .git marker is not a checkout.
        fs::create_dir_all(src.join("github.com/alice/leftover")).unwrap();

        let found = scan_checkouts(src).unwrap();
        assert_eq!(
            found,
            vec![
                "github.com/alice/widget",
                "github.com/bob/gadget",
                "gopkg.in/yaml.v2",
            ]
        );
    }

    #[test]
    fn test_scan_checkouts_missing_root() {
        let tmp = TempDir::new().unwrap();
        let found = scan_checkouts(&tmp.path().join("absent")).unwrap();
        assert!(found.is_empty());
    }
}
