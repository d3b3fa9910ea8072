// src/ops/install.rs

//! Install and update: bring every requested package to its target
//! revision, then optionally build it and record it in the manifest.
//!
//! Fetches run on a bounded worker pool since they are network-bound.
//! Builds and manifest writes happen sequentially afterwards, in
//! request order, so two packages can never race on shared state.

use std::collections::HashSet;
use std::path::Path;

use rayon::prelude::*;
use tracing::warn;

use crate::error::Result;
use crate::fetch::{self, FetchAction, FetchOptions, FetchResult, PackageFetcher};
use crate::git::Vcs;
use crate::lock::{Lock, DEFAULT_LOCK_PATH};
use crate::manifest::{Manifest, DEFAULT_MANIFEST_PATH};
use crate::ops::{OperationReport, PackageStatus, DEFAULT_JOBS};
use crate::progress::ProgressSink;
use crate::spec::PackageSpec;
use crate::toolchain;
use crate::vendor::VendorTree;

#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Raw package specifiers. Empty means install from the manifest.
    pub packages: Vec<String>,
    /// Record explicitly named packages in the manifest afterwards.
    pub save: bool,
    /// Operate on `$GOPATH` instead of the project vendor tree. Only
    /// consulted for explicitly named packages.
    pub global: bool,
    pub force_update: bool,
    pub check_upstream: bool,
    pub respect_locked: bool,
    /// Concurrent fetch workers.
    pub jobs: usize,
    /// Run `go install` for packages whose sources changed.
    pub build: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            save: false,
            global: false,
            force_update: false,
            check_upstream: false,
            respect_locked: false,
            jobs: DEFAULT_JOBS,
            build: true,
        }
    }
}

/// Per-package result of the parallel fetch phase, collected in
/// request order before any shared state is touched.
enum FetchPhase {
    Fetched(FetchResult),
    Failed { import_path: String, error: String },
}

pub fn install(
    project_root: &Path,
    vcs: &dyn Vcs,
    opts: &InstallOptions,
    progress: &dyn ProgressSink,
) -> Result<OperationReport> {
    let mut report = OperationReport::new();

    // Resolve every specifier up front. A bad specifier fails that
    // package alone; the rest still install.
    let mut specs: Vec<PackageSpec> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    if opts.packages.is_empty() {
        let manifest = Manifest::load(&project_root.join(DEFAULT_MANIFEST_PATH))?;
        for entry in manifest.packages() {
            if seen.insert(entry.import_path.clone()) {
                specs.push(entry.to_spec());
            }
        }
    } else {
        for raw in &opts.packages {
            match PackageSpec::parse(raw) {
                Ok(spec) => {
                    if seen.insert(spec.import_path.clone()) {
                        specs.push(spec);
                    }
                }
                Err(err) => report.push(
                    raw.clone(),
                    PackageStatus::Failed {
                        error: err.to_string(),
                    },
                ),
            }
        }
    }

    // Manifest-driven installs always target the project tree.
    let tree = if opts.packages.is_empty() {
        VendorTree::local(project_root)
    } else {
        VendorTree::select(project_root, opts.global)?
    };
    tree.ensure_layout()?;

    let lock = Lock::load(&project_root.join(DEFAULT_LOCK_PATH))?;
    let fetcher = PackageFetcher::new(&tree, vcs).with_lock(&lock);
    let fetch_opts = FetchOptions {
        force_update: opts.force_update,
        check_upstream: opts.check_upstream,
        respect_locked: opts.respect_locked,
    };

    let operation = if opts.force_update { "update" } else { "install" };
    progress.begin(operation, specs.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()?;
    let phases: Vec<FetchPhase> = pool.install(|| {
        specs
            .par_iter()
            .map(|spec| {
                progress.package_started(&spec.import_path);
                match fetcher.ensure(spec, &fetch_opts) {
                    Ok(result) => FetchPhase::Fetched(result),
                    Err(err) => FetchPhase::Failed {
                        import_path: spec.import_path.clone(),
                        error: err.to_string(),
                    },
                }
            })
            .collect()
    });

    // Without a go binary there is nothing to build; vendoring alone
    // still succeeds.
    let build = opts.build
        && match toolchain::go_binary() {
            Ok(_) => true,
            Err(_) => {
                warn!("go binary not found on PATH; skipping builds");
                false
            }
        };

    // Apply phase: builds and bookkeeping, one package at a time.
    let mut ready: Vec<String> = Vec::new();
    for phase in phases {
        match phase {
            FetchPhase::Fetched(result) => {
                if build && result.changed() {
                    if let Err(err) = toolchain::build_package(&tree, &result.import_path) {
                        progress.package_finished(&result.import_path, false, "build failed");
                        report.push(
                            result.import_path,
                            PackageStatus::Failed {
                                error: err.to_string(),
                            },
                        );
                        continue;
                    }
                }
                let detail = match result.action {
                    FetchAction::Cloned => format!("cloned at {}", fetch::short(&result.revision)),
                    FetchAction::Updated => format!("now at {}", fetch::short(&result.revision)),
                    FetchAction::Unchanged => "up to date".to_string(),
                };
                progress.package_finished(&result.import_path, true, &detail);
                ready.push(result.import_path.clone());
                report.push(
                    result.import_path,
                    PackageStatus::Installed {
                        revision: result.revision,
                        action: result.action,
                    },
                );
            }
            FetchPhase::Failed { import_path, error } => {
                progress.package_finished(&import_path, false, &error);
                report.push(import_path, PackageStatus::Failed { error });
            }
        }
    }

    // Only packages that actually made it are recorded.
    if opts.save && !opts.packages.is_empty() {
        let mut manifest = Manifest::load_or_new(&project_root.join(DEFAULT_MANIFEST_PATH))?;
        let mut dirty = false;
        for spec in &specs {
            if ready.contains(&spec.import_path) && manifest.add_package(spec) {
                dirty = true;
            }
        }
        if dirty {
            manifest.save()?;
        }
    }

    let summary = if report.is_success() {
        format!(
            "{} packages ready, {} changed",
            report.succeeded(),
            report.changed()
        )
    } else {
        format!("{} of {} packages failed", report.failed(), report.len())
    };
    progress.finish(&summary);

    Ok(report)
}
