// src/toolchain.rs

//! Running the build toolchain inside a vendor tree's environment
//!
//! Child processes get the tree's variable overrides applied
//! explicitly via `Command::envs`; the parent process environment is
//! never modified. Build steps run with output captured and a hard
//! timeout; pass-through commands (`go`, `exec`, `shell`) inherit the
//! terminal and run unbounded.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use wait_timeout::ChildExt;

use crate::vendor::VendorTree;

/// Timeout for one `go install` build step.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("'{0}' binary not found on PATH")]
    MissingBinary(String),

    #[error("Failed to run {command}: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} timed out after {seconds} seconds")]
    TimedOut { command: String, seconds: u64 },

    #[error("{command} failed with exit code {code}: {stderr}")]
    BuildFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Toolchain I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Locate the `go` binary.
pub fn go_binary() -> Result<PathBuf, ToolchainError> {
    which::which("go").map_err(|_| ToolchainError::MissingBinary("go".to_string()))
}

/// Compile and install one vendored package: `go install <import-path>`
/// against the tree, populating `pkg/` and `bin/`.
pub fn build_package(tree: &VendorTree, import_path: &str) -> Result<(), ToolchainError> {
    let go = go_binary()?;
    let command = format!("go install {}", import_path);
    debug!("Running {}", command);

    let mut child = Command::new(&go)
        .args(["install", import_path])
        .envs(tree.environment())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolchainError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

    match child.wait_timeout(BUILD_TIMEOUT)? {
        Some(status) => {
            let output = child.wait_with_output()?;
            if status.success() {
                info!("Built {}", import_path);
                Ok(())
            } else {
                Err(ToolchainError::BuildFailed {
                    command,
                    code: status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                })
            }
        }
        None => {
            let _ = child.kill();
            Err(ToolchainError::TimedOut {
                command,
                seconds: BUILD_TIMEOUT.as_secs(),
            })
        }
    }
}

/// Run a program with the tree's environment applied, terminal
/// attached. Used by the pass-through commands; blocks until the child
/// exits and reports its status.
pub fn run_with_env(
    program: &Path,
    args: &[String],
    tree: &VendorTree,
) -> Result<ExitStatus, ToolchainError> {
    let command = format!("{} {}", program.display(), args.join(" "));
    debug!("Running {}", command);

    let status = Command::new(program)
        .args(args)
        .envs(tree.environment())
        .status()
        .map_err(|source| ToolchainError::SpawnFailed { command, source })?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_with_env_applies_overrides() {
        if which::which("sh").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let tree = VendorTree::local(dir.path());

        let script = format!(
            "test \"$GOPATH\" = \"{}\" && test \"$GOBIN\" = \"{}\"",
            tree.root().display(),
            tree.bin_dir().display()
        );
        let status =
            run_with_env(Path::new("sh"), &["-c".to_string(), script], &tree).unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_run_with_env_reports_child_status() {
        if which::which("sh").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let tree = VendorTree::local(dir.path());

        let status = run_with_env(
            Path::new("sh"),
            &["-c".to_string(), "exit 3".to_string()],
            &tree,
        )
        .unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
