// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! Builds throwaway git repositories on disk and points the fetch
//! engine at them through a URL-rewriting [`Vcs`] wrapper, so the full
//! clone/checkout/ls-remote path runs against the real git binary
//! without any network access.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use bale::ops::InstallOptions;
use bale::{GitCli, GitError, Vcs};

/// True when the git binary is available. Tests bail out early
/// otherwise.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Run git in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// HEAD revision of a repository or checkout.
pub fn head_of(repo: &Path) -> String {
    git(repo, &["rev-parse", "HEAD"])
}

/// `Vcs` wrapper that maps the https clone URL for an import path onto
/// a repository under a local base directory.
pub struct LocalVcs {
    inner: GitCli,
    base: PathBuf,
}

impl LocalVcs {
    pub fn new(base: &Path) -> Self {
        Self {
            inner: GitCli::new().expect("git not found"),
            base: base.to_path_buf(),
        }
    }

    /// `https://github.com/acme/widget.git` -> `<base>/github.com/acme/widget`
    fn rewrite(&self, url: &str) -> String {
        let trimmed = url.strip_prefix("https://").unwrap_or(url);
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        self.base.join(trimmed).display().to_string()
    }
}

impl Vcs for LocalVcs {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        self.inner.clone_repo(&self.rewrite(url), dest)
    }

    fn fetch(&self, repo: &Path) -> Result<(), GitError> {
        self.inner.fetch(repo)
    }

    fn checkout(&self, repo: &Path, revision: &str) -> Result<(), GitError> {
        self.inner.checkout(repo, revision)
    }

    fn head_revision(&self, repo: &Path) -> Result<String, GitError> {
        self.inner.head_revision(repo)
    }

    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String, GitError> {
        self.inner.resolve_ref(repo, reference)
    }

    fn default_branch(&self, repo: &Path) -> Result<String, GitError> {
        self.inner.default_branch(repo)
    }

    fn is_dirty(&self, repo: &Path) -> Result<bool, GitError> {
        self.inner.is_dirty(repo)
    }

    fn remote_tip(&self, url: &str, reference: Option<&str>) -> Result<String, GitError> {
        self.inner.remote_tip(&self.rewrite(url), reference)
    }
}

/// A test project: a project root plus a directory of fixture
/// repositories standing in for remote hosting.
///
/// Keep the struct alive for the duration of the test; dropping it
/// deletes both directories.
pub struct Project {
    project: TempDir,
    remotes: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            project: TempDir::new().unwrap(),
            remotes: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.project.path()
    }

    pub fn vcs(&self) -> LocalVcs {
        LocalVcs::new(self.remotes.path())
    }

    fn remote_dir(&self, import_path: &str) -> PathBuf {
        self.remotes.path().join(import_path)
    }

    /// Create a fixture repository with one commit on `master`.
    /// Returns the commit revision.
    pub fn add_remote(&self, import_path: &str) -> String {
        let repo = self.remote_dir(import_path);
        fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "--quiet"]);
        git(&repo, &["config", "user.email", "test@example.com"]);
        git(&repo, &["config", "user.name", "test"]);
        git(&repo, &["config", "commit.gpgsign", "false"]);

        fs::write(repo.join("main.go"), "package main\n").unwrap();
        git(&repo, &["add", "."]);
        git(&repo, &["commit", "--quiet", "-m", "initial"]);
        git(&repo, &["branch", "-M", "master"]);
        head_of(&repo)
    }

    /// Add a commit to a fixture repository's current branch and return
    /// the new tip.
    pub fn advance_remote(&self, import_path: &str) -> String {
        let repo = self.remote_dir(import_path);
        let marker = repo.join("CHANGES");
        let mut content = fs::read_to_string(&marker).unwrap_or_default();
        content.push_str("change\n");
        fs::write(&marker, content).unwrap();
        git(&repo, &["add", "."]);
        git(&repo, &["commit", "--quiet", "-m", "change"]);
        head_of(&repo)
    }

    /// Create a branch with one extra commit, leaving the repository
    /// back on `master`. Returns the branch tip.
    pub fn branch_remote(&self, import_path: &str, branch: &str) -> String {
        let repo = self.remote_dir(import_path);
        git(&repo, &["checkout", "--quiet", "-b", branch]);
        fs::write(repo.join("branch.go"), "package main\n").unwrap();
        git(&repo, &["add", "."]);
        git(&repo, &["commit", "--quiet", "-m", "branch work"]);
        let tip = head_of(&repo);
        git(&repo, &["checkout", "--quiet", "master"]);
        tip
    }

    /// Tag the current tip of a fixture repository.
    pub fn tag_remote(&self, import_path: &str, tag: &str) {
        let repo = self.remote_dir(import_path);
        git(&repo, &["tag", tag]);
    }

    /// Where an installed package's checkout lives.
    pub fn checkout_dir(&self, import_path: &str) -> PathBuf {
        self.root().join(".vendor").join("src").join(import_path)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join("Balefile")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root().join("Balefile.lock")
    }

    pub fn write_manifest(&self, content: &str) {
        fs::write(self.manifest_path(), content).unwrap();
    }

    pub fn read_manifest(&self) -> String {
        fs::read_to_string(self.manifest_path()).unwrap()
    }
}

/// Install options for explicit packages with builds disabled; the
/// test environment has no go toolchain.
pub fn install_opts(packages: &[&str]) -> InstallOptions {
    InstallOptions {
        packages: packages.iter().map(|s| s.to_string()).collect(),
        build: false,
        ..InstallOptions::default()
    }
}
