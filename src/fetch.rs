// src/fetch.rs

//! Ensuring packages exist at the right revision
//!
//! [`PackageFetcher`] owns the source cache under a vendor tree's `src/`
//! directory. `ensure` materializes one package according to a fixed
//! precedence: a locked revision (when requested) beats the manifest
//! constraint, which beats the remote default branch tip. Repeated calls
//! with no upstream movement are no-ops.
//!
//! Safety rules, in order:
//! - fresh clones stage into a temporary sibling directory and are
//!   renamed into place only after the target revision is checked out,
//!   so an aborted fetch never leaves a partial entry
//! - a working tree with local modifications is never overwritten
//! - every mutation of one import path holds an advisory file lock, so
//!   concurrent processes do not race on the same entry
//! - a locked revision that cannot be produced is a hard failure, never
//!   silently substituted
//!
//! The fetcher never touches the manifest or the lock file; it reports
//! outcomes and the operation layer decides what to persist.

use std::fs::{self, File};
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::git::{GitError, Vcs};
use crate::lock::Lock;
use crate::spec::{Constraint, PackageSpec};
use crate::vendor::VendorTree;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network failure for {import_path}: {source}")]
    Network {
        import_path: String,
        source: GitError,
    },

    #[error("Package {import_path} not found: {source}")]
    NotFound {
        import_path: String,
        source: GitError,
    },

    #[error("{import_path} has local modifications; refusing to overwrite")]
    Dirty { import_path: String },

    #[error("Cannot produce '{target}' for {import_path}: {reason}")]
    Conflict {
        import_path: String,
        target: String,
        reason: String,
    },

    #[error("Failed to lock fetch of {import_path}: {source}")]
    LockFailed {
        import_path: String,
        source: std::io::Error,
    },

    #[error("Failed to stage {import_path}: {source}")]
    StageFailed {
        import_path: String,
        source: std::io::Error,
    },

    #[error("Version control failure for {import_path}: {source}")]
    Git {
        import_path: String,
        source: GitError,
    },
}

/// Knobs for a single ensure pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Re-fetch remote refs and move to the newly resolved tip even if
    /// the package is already present.
    pub force_update: bool,
    /// Compare against the remote before deciding; refresh only when
    /// the upstream tip differs from the local one.
    pub check_upstream: bool,
    /// Prefer the locked revision over the manifest constraint.
    pub respect_locked: bool,
}

/// What `ensure` did to the source entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAction {
    /// Fresh clone placed into the tree
    Cloned,
    /// Existing entry moved to a different revision
    Updated,
    /// Already at the target revision
    Unchanged,
}

/// Outcome of one ensure pass.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub import_path: String,
    /// Full revision now checked out
    pub revision: String,
    pub action: FetchAction,
}

impl FetchResult {
    pub fn changed(&self) -> bool {
        self.action != FetchAction::Unchanged
    }
}

/// Read-only comparison of a source entry against its remote.
#[derive(Debug, Clone)]
pub struct UpstreamStatus {
    pub import_path: String,
    /// Revision checked out locally, None when not installed
    pub local: Option<String>,
    /// Current tip of the constraint's ref (or remote HEAD) upstream
    pub upstream: String,
    pub outdated: bool,
}

/// Revision-selection outcome of the precedence rules in `ensure`.
#[derive(Debug)]
enum Target {
    Locked(String),
    Pinned(String),
    Named(String),
    DefaultTip,
}

impl Target {
    fn describe(&self) -> String {
        match self {
            Target::Locked(rev) => format!("locked revision {}", rev),
            Target::Pinned(rev) => rev.clone(),
            Target::Named(name) => name.clone(),
            Target::DefaultTip => "default branch tip".to_string(),
        }
    }

    /// A missing locked/pinned/named target is a constraint conflict; a
    /// missing default tip means the repository itself is broken.
    fn miss_is_conflict(&self) -> bool {
        !matches!(self, Target::DefaultTip)
    }
}

/// Ensures source entries exist at the revision the operation asks for.
pub struct PackageFetcher<'a> {
    tree: &'a VendorTree,
    vcs: &'a dyn Vcs,
    locked: Option<&'a Lock>,
}

impl<'a> PackageFetcher<'a> {
    pub fn new(tree: &'a VendorTree, vcs: &'a dyn Vcs) -> Self {
        Self {
            tree,
            vcs,
            locked: None,
        }
    }

    /// Provide locked revisions for `respect_locked` passes.
    pub fn with_lock(mut self, lock: &'a Lock) -> Self {
        self.locked = Some(lock);
        self
    }

    /// Make sure `spec` is present at its target revision. Idempotent:
    /// present-at-target with no flags set is a no-op.
    pub fn ensure(&self, spec: &PackageSpec, opts: &FetchOptions) -> Result<FetchResult, FetchError> {
        let import_path = spec.import_path.as_str();
        let dest = self.tree.source_entry(import_path);
        let _guard = self.acquire_path_lock(import_path)?;

        let target = self.select_target(spec, opts);
        debug!("Ensuring {} ({})", import_path, target.describe());

        if !is_checkout(&dest) {
            let revision = self.clone_into_place(spec, &dest, &target)?;
            info!("Installed {} at {}", import_path, short(&revision));
            return Ok(FetchResult {
                import_path: import_path.to_string(),
                revision,
                action: FetchAction::Cloned,
            });
        }

        let mut refreshed = false;
        if opts.force_update {
            self.vcs.fetch(&dest).map_err(|e| self.from_git(spec, e))?;
            refreshed = true;
        } else if opts.check_upstream && self.upstream_differs(spec, &dest, &target)? {
            self.vcs.fetch(&dest).map_err(|e| self.from_git(spec, e))?;
            refreshed = true;
        }

        let revision = self.resolve_target(spec, &dest, &target, &mut refreshed)?;
        let head = self
            .vcs
            .head_revision(&dest)
            .map_err(|e| self.from_git(spec, e))?;
        if head == revision {
            debug!("{} already at {}", import_path, short(&head));
            return Ok(FetchResult {
                import_path: import_path.to_string(),
                revision: head,
                action: FetchAction::Unchanged,
            });
        }

        // The entry moves; from here on the working tree gets touched.
        if self.vcs.is_dirty(&dest).map_err(|e| self.from_git(spec, e))? {
            return Err(FetchError::Dirty {
                import_path: import_path.to_string(),
            });
        }
        self.vcs
            .checkout(&dest, &revision)
            .map_err(|e| self.from_git(spec, e))?;
        info!(
            "Updated {} {} -> {}",
            import_path,
            short(&head),
            short(&revision)
        );
        Ok(FetchResult {
            import_path: import_path.to_string(),
            revision,
            action: FetchAction::Updated,
        })
    }

    /// Compare the local checkout against the remote without mutating
    /// anything: no fetch, no checkout, no manifest or lock access.
    pub fn check_upstream_status(&self, spec: &PackageSpec) -> Result<UpstreamStatus, FetchError> {
        let import_path = spec.import_path.as_str();
        let dest = self.tree.source_entry(import_path);
        let local = if is_checkout(&dest) {
            Some(
                self.vcs
                    .head_revision(&dest)
                    .map_err(|e| self.from_git(spec, e))?,
            )
        } else {
            None
        };

        let reference = match &spec.constraint {
            Constraint::Named(name) => Some(name.as_str()),
            // A pin has no upstream ref to follow; compare remote HEAD
            _ => None,
        };
        let upstream = self
            .vcs
            .remote_tip(&spec.clone_url(), reference)
            .map_err(|e| self.from_git(spec, e))?;

        let outdated = local.as_deref() != Some(upstream.as_str());
        Ok(UpstreamStatus {
            import_path: import_path.to_string(),
            local,
            upstream,
            outdated,
        })
    }

    /// Head revision of an installed entry, if present.
    pub fn installed_revision(&self, import_path: &str) -> Result<Option<String>, FetchError> {
        let dest = self.tree.source_entry(import_path);
        if !is_checkout(&dest) {
            return Ok(None);
        }
        self.vcs
            .head_revision(&dest)
            .map(Some)
            .map_err(|source| FetchError::Git {
                import_path: import_path.to_string(),
                source,
            })
    }

    fn select_target(&self, spec: &PackageSpec, opts: &FetchOptions) -> Target {
        if opts.respect_locked {
            if let Some(revision) = self.locked.and_then(|l| l.get(&spec.import_path)) {
                return Target::Locked(revision.to_string());
            }
        }
        match &spec.constraint {
            Constraint::Pinned(rev) => Target::Pinned(rev.clone()),
            Constraint::Named(name) => Target::Named(name.clone()),
            Constraint::Default => Target::DefaultTip,
        }
    }

    /// Clone into a temporary sibling directory, check out the target
    /// there, and only then rename into place.
    fn clone_into_place(
        &self,
        spec: &PackageSpec,
        dest: &Path,
        target: &Target,
    ) -> Result<String, FetchError> {
        let import_path = spec.import_path.as_str();
        let parent = dest.parent().expect("source entries always have a parent");
        let stage_err = |source| FetchError::StageFailed {
            import_path: import_path.to_string(),
            source,
        };

        fs::create_dir_all(parent).map_err(stage_err)?;
        let staging = tempfile::tempdir_in(parent).map_err(stage_err)?;
        let staged = staging.path().join("repo");

        self.vcs
            .clone_repo(&spec.clone_url(), &staged)
            .map_err(|e| self.from_git(spec, e))?;

        // A fresh clone already knows the current remote refs.
        let mut refreshed = true;
        let revision = self.resolve_target(spec, &staged, target, &mut refreshed)?;
        let head = self
            .vcs
            .head_revision(&staged)
            .map_err(|e| self.from_git(spec, e))?;
        if head != revision {
            self.vcs
                .checkout(&staged, &revision)
                .map_err(|e| self.from_git(spec, e))?;
        }

        if dest.exists() {
            // Leftover that never was a checkout; replace it.
            warn!("Replacing stale entry at {}", dest.display());
            fs::remove_dir_all(dest).map_err(stage_err)?;
        }
        fs::rename(&staged, dest).map_err(stage_err)?;
        Ok(revision)
    }

    /// Resolve the target to a full revision, fetching refs once when
    /// the first attempt misses and no fetch has happened yet.
    fn resolve_target(
        &self,
        spec: &PackageSpec,
        repo: &Path,
        target: &Target,
        refreshed: &mut bool,
    ) -> Result<String, FetchError> {
        let reference = match target {
            Target::Locked(rev) | Target::Pinned(rev) => rev.clone(),
            Target::Named(name) => name.clone(),
            Target::DefaultTip => {
                let branch = self
                    .vcs
                    .default_branch(repo)
                    .map_err(|e| self.from_git(spec, e))?;
                branch
            }
        };

        let mut attempt = self.vcs.resolve_ref(repo, &reference);
        if matches!(&attempt, Err(e) if e.is_not_found()) && !*refreshed {
            self.vcs.fetch(repo).map_err(|e| self.from_git(spec, e))?;
            *refreshed = true;
            attempt = self.vcs.resolve_ref(repo, &reference);
        }

        match attempt {
            Ok(revision) => Ok(revision),
            Err(e) if e.is_not_found() && target.miss_is_conflict() => {
                Err(FetchError::Conflict {
                    import_path: spec.import_path.clone(),
                    target: target.describe(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(self.from_git(spec, e)),
        }
    }

    /// True when the remote tip of the target's ref differs from what
    /// the local clone knows. Pins have nothing to compare.
    fn upstream_differs(
        &self,
        spec: &PackageSpec,
        repo: &Path,
        target: &Target,
    ) -> Result<bool, FetchError> {
        let (reference, local) = match target {
            Target::Locked(_) | Target::Pinned(_) => return Ok(false),
            Target::Named(name) => (Some(name.as_str()), self.vcs.resolve_ref(repo, name).ok()),
            Target::DefaultTip => {
                let branch = self
                    .vcs
                    .default_branch(repo)
                    .map_err(|e| self.from_git(spec, e))?;
                (None, self.vcs.resolve_ref(repo, &branch).ok())
            }
        };
        let upstream = self
            .vcs
            .remote_tip(&spec.clone_url(), reference)
            .map_err(|e| self.from_git(spec, e))?;
        Ok(local.as_deref() != Some(upstream.as_str()))
    }

    /// Advisory per-import-path lock under the tree root. Blocks until
    /// any concurrent fetch of the same path finishes; released when the
    /// guard drops.
    fn acquire_path_lock(&self, import_path: &str) -> Result<FetchGuard, FetchError> {
        let lock_err = |source| FetchError::LockFailed {
            import_path: import_path.to_string(),
            source,
        };
        let dir = self.tree.lock_dir();
        fs::create_dir_all(&dir).map_err(lock_err)?;
        let file = File::create(dir.join(import_path.replace('/', "--"))).map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        Ok(FetchGuard { _file: file })
    }

    fn from_git(&self, spec: &PackageSpec, source: GitError) -> FetchError {
        let import_path = spec.import_path.clone();
        if source.is_network() {
            FetchError::Network {
                import_path,
                source,
            }
        } else if source.is_not_found() {
            FetchError::NotFound {
                import_path,
                source,
            }
        } else {
            FetchError::Git {
                import_path,
                source,
            }
        }
    }
}

/// A source entry counts as installed once it has version control
/// metadata; anything else is a leftover.
pub fn is_checkout(dest: &Path) -> bool {
    dest.join(".git").exists()
}

/// Abbreviate a revision for log lines.
pub fn short(revision: &str) -> &str {
    if revision.len() > 10 {
        &revision[..10]
    } else {
        revision
    }
}

struct FetchGuard {
    _file: File,
}
