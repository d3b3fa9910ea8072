// src/commands/mod.rs
//! Command handlers for the bale CLI
//!
//! Each handler takes the parsed arguments for one subcommand, drives
//! the corresponding library operation, and renders the result for the
//! terminal.

mod env;
mod install;
mod progress;
mod remove;
mod state;

pub use env::{cmd_exec, cmd_go, cmd_shell, cmd_shim};
pub use install::{cmd_install, cmd_update};
pub use remove::{cmd_prune, cmd_uninstall};
pub use state::{cmd_generate, cmd_lock, cmd_outdated};

use anyhow::Result;

use bale::ops::{OperationReport, PackageStatus};
use bale::FetchAction;

/// Print one line per package outcome and fail the command when any
/// package failed. The vendor tree is left as far along as it got.
fn finish_report(report: &OperationReport) -> Result<()> {
    for outcome in report.outcomes() {
        match &outcome.status {
            PackageStatus::Installed { revision, action } => {
                let verb = match action {
                    FetchAction::Cloned => "installed",
                    FetchAction::Updated => "updated",
                    FetchAction::Unchanged => "unchanged",
                };
                println!(
                    "  [OK] {} {} at {}",
                    outcome.import_path,
                    verb,
                    bale::fetch::short(revision)
                );
            }
            PackageStatus::Removed { existed: true } => {
                println!("  [OK] {} removed", outcome.import_path);
            }
            PackageStatus::Removed { existed: false } => {
                println!("  [OK] {} was not installed", outcome.import_path);
            }
            PackageStatus::Failed { error } => {
                println!("  [FAILED] {}: {}", outcome.import_path, error);
            }
        }
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} package(s) failed",
            report.failed(),
            report.len()
        );
    }
    Ok(())
}

/// Project root for all commands: the current working directory.
fn project_root() -> Result<std::path::PathBuf> {
    Ok(std::env::current_dir()?)
}
