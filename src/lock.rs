// src/lock.rs

//! The Balefile.lock: pinned revisions for reproducible vendor trees
//!
//! The lock file is generated JSON mapping import paths to full
//! revisions, written by the `lock` operation and consumed by installs
//! running with `--locked`. It is never hand-edited.
//!
//! ```json
//! {
//!   "schema": 1,
//!   "revisions": {
//!     "github.com/acme/foo": "9b2ef11c6018c5f11cb4250213bcb25825b6a0b6"
//!   }
//! }
//! ```
//!
//! Revisions are kept in a sorted map so regenerating the file produces
//! stable diffs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::manifest::Manifest;

/// Current lock file schema version
pub const LOCK_VERSION: u32 = 1;

/// Default lock file name, relative to the project root
pub const DEFAULT_LOCK_PATH: &str = "Balefile.lock";

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Failed to read lock file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse lock file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to write lock file: {0}")]
    WriteError(std::io::Error),

    #[error("Lock schema {found} is newer than supported schema {expected}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Cannot lock {0}: not present in the vendor tree")]
    NotInstalled(String),
}

pub type LockResult<T> = Result<T, LockError>;

/// Lock file root structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lock {
    /// Lock file schema version
    pub schema: u32,

    /// Import path to full revision
    #[serde(default)]
    pub revisions: BTreeMap<String, String>,
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock {
    /// Create an empty lock.
    pub fn new() -> Self {
        Self {
            schema: LOCK_VERSION,
            revisions: BTreeMap::new(),
        }
    }

    /// Load a lock file. An absent file reads as an empty lock.
    pub fn load(path: &Path) -> LockResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(&content)
    }

    /// Parse lock JSON.
    pub fn parse(content: &str) -> LockResult<Self> {
        let lock: Lock = serde_json::from_str(content)?;
        if lock.schema > LOCK_VERSION {
            return Err(LockError::VersionMismatch {
                expected: LOCK_VERSION,
                found: lock.schema,
            });
        }
        Ok(lock)
    }

    /// Write atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> LockResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        let mut tmp = NamedTempFile::new_in(dir).map_err(LockError::WriteError)?;
        tmp.write_all(content.as_bytes())
            .map_err(LockError::WriteError)?;
        tmp.persist(path).map_err(|e| LockError::WriteError(e.error))?;
        Ok(())
    }

    /// Locked revision for an import path, if any.
    pub fn get(&self, import_path: &str) -> Option<&str> {
        self.revisions.get(import_path).map(String::as_str)
    }

    /// Record a revision, replacing any previous entry.
    pub fn set(&mut self, import_path: &str, revision: &str) {
        self.revisions
            .insert(import_path.to_string(), revision.to_string());
    }

    /// Drop entries whose import path is no longer in the manifest.
    /// Returns the dropped paths.
    pub fn reconcile(&mut self, manifest: &Manifest) -> Vec<String> {
        let dropped: Vec<String> = self
            .revisions
            .keys()
            .filter(|path| !manifest.contains(path))
            .cloned()
            .collect();
        for path in &dropped {
            self.revisions.remove(path);
        }
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let lock = Lock::load(&dir.path().join("Balefile.lock")).unwrap();
        assert!(lock.is_empty());
        assert_eq!(lock.schema, LOCK_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Balefile.lock");

        let mut lock = Lock::new();
        lock.set("github.com/acme/foo", "9b2ef11c6018c5f11cb4250213bcb25825b6a0b6");
        lock.set("github.com/acme/bar", "7f3acd9e2121f768f3acd9e2121f768813374a21");
        lock.save(&path).unwrap();

        let reloaded = Lock::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get("github.com/acme/foo"),
            Some("9b2ef11c6018c5f11cb4250213bcb25825b6a0b6")
        );
        assert_eq!(reloaded.get("github.com/acme/baz"), None);
    }

    #[test]
    fn test_sorted_output() {
        let mut lock = Lock::new();
        lock.set("github.com/zzz/last", "aaaaaaa1");
        lock.set("github.com/aaa/first", "bbbbbbb2");

        let json = serde_json::to_string_pretty(&lock).unwrap();
        let first = json.find("github.com/aaa/first").unwrap();
        let last = json.find("github.com/zzz/last").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_reconcile_drops_unmanifested() {
        let manifest =
            Manifest::parse("github.com/acme/foo\n").unwrap();
        let mut lock = Lock::new();
        lock.set("github.com/acme/foo", "aaaaaaa1");
        lock.set("github.com/acme/gone", "bbbbbbb2");

        let dropped = lock.reconcile(&manifest);
        assert_eq!(dropped, vec!["github.com/acme/gone".to_string()]);
        assert_eq!(lock.len(), 1);
        assert!(lock.get("github.com/acme/foo").is_some());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Lock::parse("not json at all"),
            Err(LockError::ParseError(_))
        ));

        let err = Lock::parse(r#"{"schema": 99, "revisions": {}}"#).unwrap_err();
        assert!(matches!(
            err,
            LockError::VersionMismatch {
                expected: LOCK_VERSION,
                found: 99
            }
        ));
    }
}
