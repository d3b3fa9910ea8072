// src/commands/install.rs
//! Package installation and update commands

use anyhow::Result;
use tracing::info;

use bale::ops::{self, InstallOptions};
use bale::GitCli;

use super::progress::ConsoleProgress;
use super::{finish_report, project_root};

/// Install packages into the vendor tree
///
/// With explicit packages, installs exactly those; otherwise installs
/// everything the Balefile lists.
#[allow(clippy::too_many_arguments)]
pub fn cmd_install(
    packages: Vec<String>,
    save: bool,
    global: bool,
    force: bool,
    check_upstream: bool,
    locked: bool,
    jobs: usize,
    no_build: bool,
) -> Result<()> {
    let root = project_root()?;
    info!("Installing {} package(s)", packages.len());

    let vcs = GitCli::new()?;
    let opts = InstallOptions {
        packages,
        save,
        global,
        force_update: force,
        check_upstream,
        respect_locked: locked,
        jobs,
        build: !no_build,
    };

    let progress = ConsoleProgress::new();
    let report = ops::install(&root, &vcs, &opts, &progress)?;
    if report.is_empty() {
        println!("No packages to install");
        return Ok(());
    }
    finish_report(&report)
}

/// Update packages to their newest matching revision
pub fn cmd_update(
    packages: Vec<String>,
    save: bool,
    global: bool,
    check_upstream: bool,
    locked: bool,
    jobs: usize,
    no_build: bool,
) -> Result<()> {
    let root = project_root()?;
    info!("Updating {} package(s)", packages.len());

    let vcs = GitCli::new()?;
    let opts = InstallOptions {
        packages,
        save,
        global,
        force_update: true,
        check_upstream,
        respect_locked: locked,
        jobs,
        build: !no_build,
    };

    let progress = ConsoleProgress::new();
    let report = ops::install(&root, &vcs, &opts, &progress)?;
    if report.is_empty() {
        println!("No packages to update");
        return Ok(());
    }
    finish_report(&report)
}
