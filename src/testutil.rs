// src/testutil.rs

//! Shared unit-test fixtures.
//!
//! `FakeVcs` models one remote repository served to every clone URL.
//! Remote state lives in memory behind a mutex; local clone state
//! lives in marker files inside the entry's `.git` directory so it
//! survives the fetcher's staging rename.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::git::{GitError, Vcs};

pub(crate) const REV1: &str = "1111111111111111111111111111111111111111";
pub(crate) const REV2: &str = "2222222222222222222222222222222222222222";
pub(crate) const REV3: &str = "3333333333333333333333333333333333333333";

/// Remote repository state shared by every fake clone.
pub(crate) struct FakeRemote {
    default_branch: String,
    branches: HashMap<String, String>,
    tags: HashMap<String, String>,
    objects: HashSet<String>,
    reachable: bool,
}

impl FakeRemote {
    fn new() -> Self {
        let mut branches = HashMap::new();
        branches.insert("master".to_string(), REV1.to_string());
        let mut objects = HashSet::new();
        objects.insert(REV1.to_string());
        Self {
            default_branch: "master".to_string(),
            branches,
            tags: HashMap::new(),
            objects,
            reachable: true,
        }
    }
}

pub(crate) struct FakeVcs {
    remote: Mutex<FakeRemote>,
    fetches: AtomicUsize,
}

impl FakeVcs {
    pub(crate) fn new() -> Self {
        Self {
            remote: Mutex::new(FakeRemote::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn advance(&self, branch: &str, revision: &str) {
        let mut remote = self.remote.lock().unwrap();
        remote
            .branches
            .insert(branch.to_string(), revision.to_string());
        remote.objects.insert(revision.to_string());
    }

    pub(crate) fn add_tag(&self, tag: &str, revision: &str) {
        let mut remote = self.remote.lock().unwrap();
        remote.tags.insert(tag.to_string(), revision.to_string());
        remote.objects.insert(revision.to_string());
    }

    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.remote.lock().unwrap().reachable = reachable;
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_dirty(repo: &Path) {
        fs::write(repo.join(".git/dirty"), b"").unwrap();
    }

    fn snapshot(remote: &FakeRemote, repo: &Path) -> Result<(), GitError> {
        let mut refs = String::new();
        for (name, rev) in &remote.branches {
            refs.push_str(&format!("branch {} {}\n", name, rev));
        }
        for (name, rev) in &remote.tags {
            refs.push_str(&format!("tag {} {}\n", name, rev));
        }
        fs::write(repo.join(".git/refs"), refs)?;

        let mut objects: HashSet<String> = match fs::read_to_string(repo.join(".git/objects")) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => HashSet::new(),
        };
        objects.extend(remote.objects.iter().cloned());
        let listing: Vec<String> = objects.into_iter().collect();
        fs::write(repo.join(".git/objects"), listing.join("\n"))?;
        Ok(())
    }

    fn read_refs(repo: &Path) -> HashMap<(String, String), String> {
        let mut refs = HashMap::new();
        if let Ok(content) = fs::read_to_string(repo.join(".git/refs")) {
            for line in content.lines() {
                let mut fields = line.split_whitespace();
                if let (Some(kind), Some(name), Some(rev)) =
                    (fields.next(), fields.next(), fields.next())
                {
                    refs.insert((kind.to_string(), name.to_string()), rev.to_string());
                }
            }
        }
        refs
    }

    fn objects(repo: &Path) -> HashSet<String> {
        fs::read_to_string(repo.join(".git/objects"))
            .map(|c| c.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn unreachable(op: &str) -> GitError {
        GitError::Network {
            command: op.to_string(),
            stderr: "could not resolve host".to_string(),
        }
    }
}

impl Vcs for FakeVcs {
    fn clone_repo(&self, _url: &str, dest: &Path) -> Result<(), GitError> {
        let remote = self.remote.lock().unwrap();
        if !remote.reachable {
            return Err(Self::unreachable("clone"));
        }
        fs::create_dir_all(dest.join(".git"))?;
        Self::snapshot(&remote, dest)?;
        fs::write(dest.join(".git/default"), &remote.default_branch)?;
        let head = remote.branches[&remote.default_branch].clone();
        fs::write(dest.join(".git/HEAD"), head)?;
        Ok(())
    }

    fn fetch(&self, repo: &Path) -> Result<(), GitError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let remote = self.remote.lock().unwrap();
        if !remote.reachable {
            return Err(Self::unreachable("fetch"));
        }
        Self::snapshot(&remote, repo)
    }

    fn checkout(&self, repo: &Path, revision: &str) -> Result<(), GitError> {
        if !Self::objects(repo).contains(revision) {
            return Err(GitError::NotFound {
                command: format!("checkout {}", revision),
                stderr: "bad revision".to_string(),
            });
        }
        fs::write(repo.join(".git/HEAD"), revision)?;
        Ok(())
    }

    fn head_revision(&self, repo: &Path) -> Result<String, GitError> {
        Ok(fs::read_to_string(repo.join(".git/HEAD"))?.trim().to_string())
    }

    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String, GitError> {
        let refs = Self::read_refs(repo);
        for kind in ["branch", "tag"] {
            if let Some(rev) = refs.get(&(kind.to_string(), reference.to_string())) {
                return Ok(rev.clone());
            }
        }
        if let Some(rev) = Self::objects(repo)
            .iter()
            .find(|o| o.starts_with(reference))
        {
            return Ok(rev.clone());
        }
        Err(GitError::NotFound {
            command: format!("rev-parse {}", reference),
            stderr: format!("unknown revision {}", reference),
        })
    }

    fn default_branch(&self, repo: &Path) -> Result<String, GitError> {
        Ok(fs::read_to_string(repo.join(".git/default"))?.trim().to_string())
    }

    fn is_dirty(&self, repo: &Path) -> Result<bool, GitError> {
        Ok(repo.join(".git/dirty").exists())
    }

    fn remote_tip(&self, _url: &str, reference: Option<&str>) -> Result<String, GitError> {
        let remote = self.remote.lock().unwrap();
        if !remote.reachable {
            return Err(Self::unreachable("ls-remote"));
        }
        let name = reference.unwrap_or(&remote.default_branch);
        remote
            .branches
            .get(name)
            .or_else(|| remote.tags.get(name))
            .cloned()
            .ok_or_else(|| GitError::NotFound {
                command: format!("ls-remote {}", name),
                stderr: "no matching ref".to_string(),
            })
    }
}
