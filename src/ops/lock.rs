// src/ops/lock.rs

//! Lock: record the exact revision of every manifest package.
//!
//! Locking is all or nothing. A manifest package with no installed
//! checkout fails the whole operation, since a partial lock file
//! would silently float the missing packages on the next locked
//! install.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::fetch::PackageFetcher;
use crate::git::Vcs;
use crate::lock::{Lock, LockError, DEFAULT_LOCK_PATH};
use crate::manifest::{Manifest, DEFAULT_MANIFEST_PATH};
use crate::vendor::VendorTree;

pub fn lock(project_root: &Path, vcs: &dyn Vcs) -> Result<Lock> {
    let manifest = Manifest::load(&project_root.join(DEFAULT_MANIFEST_PATH))?;
    let tree = VendorTree::local(project_root);
    tree.ensure_layout()?;

    let lock_path = project_root.join(DEFAULT_LOCK_PATH);
    let mut lock = Lock::load(&lock_path)?;

    let fetcher = PackageFetcher::new(&tree, vcs);
    for entry in manifest.packages() {
        let revision = fetcher
            .installed_revision(&entry.import_path)?
            .ok_or_else(|| LockError::NotInstalled(entry.import_path.clone()))?;
        debug!("Locking {} at {}", entry.import_path, revision);
        lock.set(&entry.import_path, &revision);
    }

    let dropped = lock.reconcile(&manifest);
    for import_path in &dropped {
        debug!("Dropping stale lock entry {}", import_path);
    }

    lock.save(&lock_path)?;
    Ok(lock)
}
