// src/ops/outdated.rs

//! Outdated: report which manifest packages trail their upstream,
//! without moving anything.
//!
//! Upstream tips come from `ls-remote` style queries, so the local
//! checkouts are left exactly as they were, refs included.

use std::path::Path;

use rayon::prelude::*;

use crate::error::Result;
use crate::fetch::{self, PackageFetcher};
use crate::git::Vcs;
use crate::manifest::{Manifest, DEFAULT_MANIFEST_PATH};
use crate::ops::DEFAULT_JOBS;
use crate::progress::ProgressSink;
use crate::vendor::VendorTree;

#[derive(Debug, Clone)]
pub struct OutdatedOptions {
    /// Concurrent upstream queries.
    pub jobs: usize,
}

impl Default for OutdatedOptions {
    fn default() -> Self {
        Self { jobs: DEFAULT_JOBS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutdatedStatus {
    /// Installed at the upstream tip.
    Current { revision: String },
    /// Upstream has moved, or the package is not installed at all.
    Outdated {
        local: Option<String>,
        upstream: String,
    },
    /// The upstream could not be queried.
    Unknown { error: String },
}

#[derive(Debug, Clone)]
pub struct OutdatedEntry {
    pub import_path: String,
    pub status: OutdatedStatus,
}

impl OutdatedEntry {
    pub fn is_current(&self) -> bool {
        matches!(self.status, OutdatedStatus::Current { .. })
    }
}

pub fn outdated(
    project_root: &Path,
    vcs: &dyn Vcs,
    opts: &OutdatedOptions,
    progress: &dyn ProgressSink,
) -> Result<Vec<OutdatedEntry>> {
    let manifest = Manifest::load(&project_root.join(DEFAULT_MANIFEST_PATH))?;
    let tree = VendorTree::local(project_root);
    tree.ensure_layout()?;

    let specs: Vec<_> = manifest.packages().map(|entry| entry.to_spec()).collect();
    let fetcher = PackageFetcher::new(&tree, vcs);

    progress.begin("outdated", specs.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()?;
    let entries: Vec<OutdatedEntry> = pool.install(|| {
        specs
            .par_iter()
            .map(|spec| {
                progress.package_started(&spec.import_path);
                let status = match fetcher.check_upstream_status(spec) {
                    Ok(status) if status.outdated => OutdatedStatus::Outdated {
                        local: status.local,
                        upstream: status.upstream,
                    },
                    Ok(status) => OutdatedStatus::Current {
                        revision: status.upstream,
                    },
                    Err(err) => OutdatedStatus::Unknown {
                        error: err.to_string(),
                    },
                };
                let (ok, detail) = match &status {
                    OutdatedStatus::Current { .. } => (true, "up to date".to_string()),
                    OutdatedStatus::Outdated { upstream, .. } => {
                        (true, format!("upstream at {}", fetch::short(upstream)))
                    }
                    OutdatedStatus::Unknown { error } => (false, error.clone()),
                };
                progress.package_finished(&spec.import_path, ok, &detail);
                OutdatedEntry {
                    import_path: spec.import_path.clone(),
                    status,
                }
            })
            .collect()
    });

    let behind = entries.iter().filter(|e| !e.is_current()).count();
    let summary = if behind == 0 {
        format!("all {} packages up to date", entries.len())
    } else {
        format!("{} of {} packages outdated", behind, entries.len())
    };
    progress.finish(&summary);

    Ok(entries)
}
