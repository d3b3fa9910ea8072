// src/ops/remove.rs

//! Uninstall: drop a package's source entry and its built artifacts
//! from the vendor tree, and optionally from the manifest.
//!
//! Removing a package that is not installed succeeds quietly, so an
//! uninstall can be retried after a partial failure.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::manifest::{Manifest, DEFAULT_MANIFEST_PATH};
use crate::ops::{remove_entry_and_empty_parents, OperationReport, PackageStatus};
use crate::progress::ProgressSink;
use crate::spec::PackageSpec;
use crate::vendor::VendorTree;

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    /// Raw package specifiers. Constraints are accepted and ignored.
    pub packages: Vec<String>,
    /// Drop the packages from the manifest afterwards.
    pub save: bool,
    /// Operate on `$GOPATH` instead of the project vendor tree.
    pub global: bool,
}

pub fn remove(
    project_root: &Path,
    opts: &RemoveOptions,
    progress: &dyn ProgressSink,
) -> Result<OperationReport> {
    let tree = VendorTree::select(project_root, opts.global)?;
    tree.ensure_layout()?;

    let mut report = OperationReport::new();
    progress.begin("uninstall", opts.packages.len());

    let mut removed: Vec<String> = Vec::new();
    for raw in &opts.packages {
        let spec = match PackageSpec::parse(raw) {
            Ok(spec) => spec,
            Err(err) => {
                progress.package_finished(raw, false, "invalid package path");
                report.push(
                    raw.clone(),
                    PackageStatus::Failed {
                        error: err.to_string(),
                    },
                );
                continue;
            }
        };
        let import_path = spec.import_path.clone();
        progress.package_started(&import_path);

        match remove_package(&tree, &import_path) {
            Ok(existed) => {
                let detail = if existed { "removed" } else { "not installed" };
                progress.package_finished(&import_path, true, detail);
                removed.push(import_path.clone());
                report.push(import_path, PackageStatus::Removed { existed });
            }
            Err(err) => {
                progress.package_finished(&import_path, false, &err);
                report.push(import_path, PackageStatus::Failed { error: err });
            }
        }
    }

    if opts.save {
        let mut manifest = Manifest::load_or_new(&project_root.join(DEFAULT_MANIFEST_PATH))?;
        let mut dirty = false;
        for import_path in &removed {
            if manifest.remove_package(import_path) {
                dirty = true;
            }
        }
        if dirty {
            manifest.save()?;
        }
    }

    let summary = if report.is_success() {
        format!("{} packages removed", report.changed())
    } else {
        format!("{} of {} packages failed", report.failed(), report.len())
    };
    progress.finish(&summary);

    Ok(report)
}

/// Deletes the source entry and any built archives for `import_path`.
/// Returns whether a source entry was present. Errors are rendered to
/// strings since they fail a single package, not the operation.
pub(crate) fn remove_package(
    tree: &VendorTree,
    import_path: &str,
) -> std::result::Result<bool, String> {
    let entry = tree.source_entry(import_path);
    let src_dir = tree.src_dir();

    let existed = remove_entry_and_empty_parents(&entry, &src_dir)
        .map_err(|err| format!("Cannot remove {}: {}", entry.display(), err))?;
    if existed {
        debug!("Removed source entry {}", entry.display());
    }

    // Built artifacts live under a platform directory, for example
    // pkg/linux_amd64/github.com/acme/widget.a.
    let pkg_dir = tree.pkg_dir();
    for suffix in [".a", ""] {
        let pattern = format!("{}/*/{}{}", pkg_dir.display(), import_path, suffix);
        let matches = glob::glob(&pattern)
            .map_err(|err| format!("Cannot scan built packages: {}", err))?;
        for found in matches.flatten() {
            let result = if found.is_dir() {
                remove_entry_and_empty_parents(&found, &pkg_dir).map(|_| ())
            } else {
                fs::remove_file(&found)
            };
            result.map_err(|err| format!("Cannot remove {}: {}", found.display(), err))?;
            debug!("Removed built artifact {}", found.display());
        }
    }

    Ok(existed)
}
