// src/commands/remove.rs
//! Package removal commands

use anyhow::Result;
use tracing::info;

use bale::ops::{self, RemoveOptions};

use super::progress::ConsoleProgress;
use super::{finish_report, project_root};

/// Remove packages from the vendor tree
pub fn cmd_uninstall(packages: Vec<String>, save: bool, global: bool) -> Result<()> {
    let root = project_root()?;
    info!("Removing {} package(s)", packages.len());

    let opts = RemoveOptions {
        packages,
        save,
        global,
    };
    let progress = ConsoleProgress::new();
    let report = ops::remove(&root, &opts, &progress)?;
    finish_report(&report)
}

/// Delete vendored packages the Balefile no longer lists
pub fn cmd_prune() -> Result<()> {
    let root = project_root()?;

    let progress = ConsoleProgress::new();
    let report = ops::prune(&root, false, &progress)?;
    if report.is_empty() {
        println!("Nothing to prune");
        return Ok(());
    }
    finish_report(&report)
}
