// src/ops/prune.rs

//! Prune: delete vendored checkouts the manifest no longer lists.
//!
//! The scan walks the source tree for checkouts rather than trusting
//! the lock file, so entries left behind by hand edits or crashed runs
//! are found too. Manifest entries are never touched, installed or
//! not.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::manifest::{Manifest, DEFAULT_MANIFEST_PATH};
use crate::ops::remove::remove_package;
use crate::ops::{scan_checkouts, OperationReport, PackageStatus};
use crate::progress::ProgressSink;
use crate::vendor::VendorTree;

pub fn prune(
    project_root: &Path,
    global: bool,
    progress: &dyn ProgressSink,
) -> Result<OperationReport> {
    let manifest = Manifest::load(&project_root.join(DEFAULT_MANIFEST_PATH))?;
    let tree = VendorTree::select(project_root, global)?;
    tree.ensure_layout()?;

    let keep: HashSet<&str> = manifest
        .packages()
        .map(|entry| entry.import_path.as_str())
        .collect();

    let installed = scan_checkouts(&tree.src_dir())?;
    let total = installed.len();
    let extra: Vec<String> = installed
        .into_iter()
        .filter(|path| !keep.contains(path.as_str()))
        .collect();
    debug!("{} checkouts installed, {} to prune", total, extra.len());

    let mut report = OperationReport::new();
    progress.begin("prune", extra.len());

    for import_path in extra {
        progress.package_started(&import_path);
        match remove_package(&tree, &import_path) {
            Ok(_) => {
                progress.package_finished(&import_path, true, "pruned");
                report.push(import_path, PackageStatus::Removed { existed: true });
            }
            Err(err) => {
                progress.package_finished(&import_path, false, &err);
                report.push(import_path, PackageStatus::Failed { error: err });
            }
        }
    }

    let summary = if report.is_empty() {
        "nothing to prune".to_string()
    } else {
        format!("{} packages pruned", report.changed())
    };
    progress.finish(&summary);

    Ok(report)
}
