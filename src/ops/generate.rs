// src/ops/generate.rs

//! Generate: seed a manifest from an already-populated vendor tree.
//!
//! Useful when adopting a project that vendored by hand. Entries are
//! written unconstrained; run `lock` afterwards to pin what is
//! currently checked out.

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::manifest::{Manifest, ManifestError, DEFAULT_MANIFEST_PATH};
use crate::ops::scan_checkouts;
use crate::spec::PackageSpec;
use crate::vendor::VendorTree;

pub fn generate(project_root: &Path) -> Result<Manifest> {
    let manifest_path = project_root.join(DEFAULT_MANIFEST_PATH);
    if manifest_path.exists() {
        return Err(ManifestError::AlreadyExists(manifest_path).into());
    }

    let tree = VendorTree::local(project_root);
    tree.ensure_layout()?;

    let mut manifest = Manifest::new(&manifest_path);
    for import_path in scan_checkouts(&tree.src_dir())? {
        match PackageSpec::from_parts(&import_path, None) {
            Ok(spec) => {
                manifest.add_package(&spec);
            }
            Err(err) => warn!("Skipping {}: {}", import_path, err),
        }
    }

    manifest.save()?;
    info!(
        "Generated {} with {} packages",
        manifest_path.display(),
        manifest.len()
    );
    Ok(manifest)
}
