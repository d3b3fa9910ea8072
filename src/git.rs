// src/git.rs

//! Version control operations behind a capability trait
//!
//! The fetch engine talks to version control only through [`Vcs`], so
//! policy (what to fetch, when to refuse) stays separate from transport
//! (how a clone actually happens) and tests can substitute an in-memory
//! implementation.
//!
//! [`GitCli`] is the production implementation: it shells out to the
//! `git` binary with stdin closed, output captured, and a hard timeout,
//! and classifies failures from stderr into connectivity vs missing
//! repository/ref errors.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

/// Default timeout for a single git invocation. Generous enough for an
/// initial clone over a slow link.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const NETWORK_MARKERS: &[&str] = &[
    "could not resolve host",
    "unable to access",
    "connection refused",
    "connection timed out",
    "network is unreachable",
    "operation timed out",
    "early eof",
    "remote end hung up",
];

const NOT_FOUND_MARKERS: &[&str] = &[
    "repository not found",
    "not found",
    "does not exist",
    "no such",
    "couldn't find remote ref",
    "unknown revision",
    "bad revision",
    "invalid reference",
    "pathspec",
];

#[derive(Error, Debug)]
pub enum GitError {
    #[error("git binary not found on PATH")]
    MissingBinary,

    #[error("Failed to run git {command}: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("git {command} timed out after {seconds} seconds")]
    TimedOut { command: String, seconds: u64 },

    #[error("Network failure during git {command}: {stderr}")]
    Network { command: String, stderr: String },

    #[error("Not found during git {command}: {stderr}")]
    NotFound { command: String, stderr: String },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("git I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Connectivity problems, including timeouts.
    pub fn is_network(&self) -> bool {
        matches!(self, GitError::Network { .. } | GitError::TimedOut { .. })
    }

    /// Missing repository, ref, or revision.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitError::NotFound { .. })
    }
}

/// Version control capabilities the fetch engine needs.
pub trait Vcs: Send + Sync {
    /// Clone `url` into `dest`. `dest` must not exist yet.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError>;

    /// Refresh remote refs and tags for an existing checkout.
    fn fetch(&self, repo: &Path) -> Result<(), GitError>;

    /// Check out an exact revision, detached.
    fn checkout(&self, repo: &Path, revision: &str) -> Result<(), GitError>;

    /// Revision currently checked out.
    fn head_revision(&self, repo: &Path) -> Result<String, GitError>;

    /// Resolve a branch, tag, or revision string to a full revision.
    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String, GitError>;

    /// Name of the remote default branch.
    fn default_branch(&self, repo: &Path) -> Result<String, GitError>;

    /// Whether the working tree has uncommitted changes.
    fn is_dirty(&self, repo: &Path) -> Result<bool, GitError>;

    /// Tip revision of `reference` (or HEAD) on the remote, without
    /// touching any local state.
    fn remote_tip(&self, url: &str, reference: Option<&str>) -> Result<String, GitError>;
}

/// `Vcs` implemented over the system `git` binary.
pub struct GitCli {
    program: std::path::PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Locate `git` on PATH.
    pub fn new() -> Result<Self, GitError> {
        let program = which::which("git").map_err(|_| GitError::MissingBinary)?;
        Ok(Self {
            program,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set a custom timeout for each git invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run git with stdin closed and a hard timeout, returning trimmed
    /// stdout on success.
    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, GitError> {
        let command = args.join(" ");
        debug!("Running git {}", command);

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| GitError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let output = child.wait_with_output()?;
                if status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    Err(classify_failure(command, stderr))
                }
            }
            None => {
                let _ = child.kill();
                Err(GitError::TimedOut {
                    command,
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

impl Vcs for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let dest = dest.to_string_lossy();
        self.run(None, &["clone", "--quiet", url, dest.as_ref()])?;
        Ok(())
    }

    fn fetch(&self, repo: &Path) -> Result<(), GitError> {
        self.run(Some(repo), &["fetch", "--quiet", "--tags", "--prune", "origin"])?;
        Ok(())
    }

    fn checkout(&self, repo: &Path, revision: &str) -> Result<(), GitError> {
        self.run(Some(repo), &["checkout", "--quiet", "--force", "--detach", revision])?;
        Ok(())
    }

    fn head_revision(&self, repo: &Path) -> Result<String, GitError> {
        self.run(Some(repo), &["rev-parse", "HEAD"])
    }

    fn resolve_ref(&self, repo: &Path, reference: &str) -> Result<String, GitError> {
        // Remote branches first so a fetch refreshes named constraints,
        // then tags, then anything rev-parse understands (hashes).
        let candidates = [
            format!("refs/remotes/origin/{}^{{commit}}", reference),
            format!("refs/tags/{}^{{commit}}", reference),
            format!("{}^{{commit}}", reference),
        ];
        for candidate in &candidates {
            if let Ok(revision) =
                self.run(Some(repo), &["rev-parse", "--verify", "--quiet", candidate])
            {
                return Ok(revision);
            }
        }
        Err(GitError::NotFound {
            command: format!("rev-parse {}", reference),
            stderr: format!("unknown revision or ref: {}", reference),
        })
    }

    fn default_branch(&self, repo: &Path) -> Result<String, GitError> {
        // origin/HEAD is set by clone; fall back to the usual names for
        // repositories fetched by other means.
        if let Ok(name) = self.run(
            Some(repo),
            &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
        ) {
            return Ok(name.trim_start_matches("origin/").to_string());
        }
        for candidate in ["master", "main"] {
            let reference = format!("refs/remotes/origin/{}", candidate);
            if self
                .run(Some(repo), &["rev-parse", "--verify", "--quiet", &reference])
                .is_ok()
            {
                return Ok(candidate.to_string());
            }
        }
        Err(GitError::NotFound {
            command: "symbolic-ref refs/remotes/origin/HEAD".to_string(),
            stderr: "cannot determine default branch".to_string(),
        })
    }

    fn is_dirty(&self, repo: &Path) -> Result<bool, GitError> {
        let status = self.run(Some(repo), &["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    fn remote_tip(&self, url: &str, reference: Option<&str>) -> Result<String, GitError> {
        let pattern = reference.unwrap_or("HEAD");
        let output = self.run(None, &["ls-remote", url, pattern])?;
        match output.lines().next().and_then(|l| l.split_whitespace().next()) {
            Some(revision) => Ok(revision.to_string()),
            None => Err(GitError::NotFound {
                command: format!("ls-remote {} {}", url, pattern),
                stderr: format!("no remote ref matching {}", pattern),
            }),
        }
    }
}

/// Sort a failed invocation into the error taxonomy by its stderr.
/// Connectivity markers win over not-found markers: "could not resolve
/// host" must not read as a missing repository.
fn classify_failure(command: String, stderr: String) -> GitError {
    let lowered = stderr.to_lowercase();
    if NETWORK_MARKERS.iter().any(|m| lowered.contains(m)) {
        GitError::Network { command, stderr }
    } else if NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        GitError::NotFound { command, stderr }
    } else {
        GitError::CommandFailed { command, stderr }
    }
}
