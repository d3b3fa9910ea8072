// src/error.rs
//! Crate-wide error type
//!
//! Operations bundle the per-module errors into one enum so callers
//! can match on the failing subsystem without losing the underlying
//! message. Per-package failures inside an operation are aggregated
//! into the operation report instead and never surface here.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::git::GitError;
use crate::lock::LockError;
use crate::manifest::ManifestError;
use crate::spec::ResolveError;
use crate::toolchain::ToolchainError;
use crate::vendor::EnvironmentError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("Failed to scan vendor tree: {0}")]
    Scan(#[from] walkdir::Error),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
