// src/vendor.rs

//! Vendor tree layout and toolchain environment
//!
//! A vendor tree is a GOPATH-shaped directory: `bin/` for built
//! executables, `pkg/` for compiled archives, `src/` for checked-out
//! repositories keyed by import path. Local mode keeps the tree in
//! `.vendor/` under the project root; global mode targets the real
//! `$GOPATH`.
//!
//! The tree never touches the parent process environment. Everything a
//! child toolchain process needs is returned as an explicit variable
//! list from [`VendorTree::environment`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name of a project-local vendor tree
pub const VENDOR_DIR: &str = ".vendor";

/// Subdirectories every vendor tree carries
pub const VENDOR_SUBDIRS: [&str; 3] = ["bin", "pkg", "src"];

/// Advisory lock files for in-flight fetches, kept under the root
pub const LOCK_DIR: &str = ".locks";

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("GOPATH must be set to manage packages globally")]
    GopathUnset,

    #[error("Failed to create vendor directory {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A resolved vendor root, local or global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorTree {
    root: PathBuf,
    global: bool,
}

impl VendorTree {
    /// Project-local tree rooted at `<project>/.vendor`.
    pub fn local(project_root: &Path) -> Self {
        Self {
            root: project_root.join(VENDOR_DIR),
            global: false,
        }
    }

    /// Global tree rooted at an explicit GOPATH.
    pub fn global(gopath: impl Into<PathBuf>) -> Self {
        Self {
            root: gopath.into(),
            global: true,
        }
    }

    /// Global tree rooted at `$GOPATH` from the process environment.
    pub fn global_from_env() -> Result<Self, EnvironmentError> {
        Self::global_from_value(std::env::var_os("GOPATH"))
    }

    fn global_from_value(gopath: Option<OsString>) -> Result<Self, EnvironmentError> {
        match gopath {
            Some(value) if !value.is_empty() => Ok(Self::global(PathBuf::from(value))),
            _ => Err(EnvironmentError::GopathUnset),
        }
    }

    /// Pick the tree for an operation: global when requested, otherwise
    /// local to the project root.
    pub fn select(project_root: &Path, global: bool) -> Result<Self, EnvironmentError> {
        if global {
            Self::global_from_env()
        } else {
            Ok(Self::local(project_root))
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn pkg_dir(&self) -> PathBuf {
        self.root.join("pkg")
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.root.join(LOCK_DIR)
    }

    /// Checkout directory for an import path. Paths come pre-validated
    /// by the resolver, so joining cannot escape the tree.
    pub fn source_entry(&self, import_path: &str) -> PathBuf {
        self.src_dir().join(import_path)
    }

    /// Create the `bin`/`pkg`/`src` triad and the lock directory.
    /// Safe to call on every operation; existing directories are kept.
    pub fn ensure_layout(&self) -> Result<(), EnvironmentError> {
        for sub in VENDOR_SUBDIRS {
            create_dir(&self.root.join(sub))?;
        }
        create_dir(&self.lock_dir())?;
        Ok(())
    }

    /// Environment for child toolchain processes, given the invoking
    /// process's PATH. The tree's `bin` goes first so vendored tools
    /// shadow system ones.
    pub fn environment_with_path(&self, existing_path: Option<&str>) -> Vec<(String, String)> {
        let root = self.root.display().to_string();
        let bin = self.bin_dir().display().to_string();
        let path = match existing_path {
            Some(existing) if !existing.is_empty() => format!("{}:{}", bin, existing),
            _ => bin.clone(),
        };
        vec![
            ("GOPATH".to_string(), root),
            ("GOBIN".to_string(), bin),
            ("PATH".to_string(), path),
        ]
    }

    /// Environment composed against the current process PATH.
    pub fn environment(&self) -> Vec<(String, String)> {
        let current = std::env::var("PATH").ok();
        self.environment_with_path(current.as_deref())
    }
}

fn create_dir(path: &Path) -> Result<(), EnvironmentError> {
    fs::create_dir_all(path).map_err(|source| EnvironmentError::CreateFailed {
        path: path.to_path_buf(),
        source,
    })
}
