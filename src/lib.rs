// src/lib.rs

//! Bale: project-local dependency management for GOPATH-era Go
//!
//! Bale keeps a project's Go dependencies in a `.vendor` tree next to
//! the code instead of a shared global GOPATH. A plain-text `Balefile`
//! lists the wanted packages, an optional `Balefile.lock` pins exact
//! revisions, and the vendor tree holds one git checkout per import
//! path.
//!
//! # Architecture
//!
//! - `spec`: package specifier parsing and shorthand expansion
//! - `manifest` / `lock`: the two persisted files and their formats
//! - `vendor`: the `.vendor` (or `$GOPATH`) directory layout
//! - `git` / `fetch`: revision resolution and atomic checkout staging
//! - `ops`: cross-package operations with per-package failure isolation
//! - `toolchain`: the wrapped `go` tool and the build environment

mod error;
pub mod fetch;
pub mod git;
pub mod lock;
pub mod manifest;
pub mod ops;
pub mod progress;
pub mod spec;
pub mod toolchain;
pub mod vendor;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
pub use fetch::{FetchAction, FetchOptions, FetchResult, PackageFetcher, UpstreamStatus};
pub use git::{GitCli, GitError, Vcs};
pub use lock::{Lock, DEFAULT_LOCK_PATH};
pub use manifest::{Manifest, ManifestEntry, DEFAULT_MANIFEST_PATH};
pub use progress::{LogProgress, ProgressSink, SilentProgress};
pub use spec::{Constraint, PackageSpec};
pub use vendor::VendorTree;
