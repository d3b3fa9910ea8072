// src/commands/state.rs
//! Manifest and lock maintenance commands

use anyhow::Result;

use bale::fetch::short;
use bale::ops::{self, OutdatedOptions, OutdatedStatus};
use bale::{GitCli, DEFAULT_LOCK_PATH, DEFAULT_MANIFEST_PATH};

use super::progress::ConsoleProgress;
use super::project_root;

/// Pin every manifest package at its installed revision
pub fn cmd_lock() -> Result<()> {
    let root = project_root()?;
    let vcs = GitCli::new()?;

    let lock = ops::lock(&root, &vcs)?;
    println!("Pinned {} package(s) in {}", lock.len(), DEFAULT_LOCK_PATH);
    for (import_path, revision) in &lock.revisions {
        println!("  {} {}", import_path, short(revision));
    }
    Ok(())
}

/// Create a Balefile from an existing vendor tree
pub fn cmd_generate() -> Result<()> {
    let root = project_root()?;

    let manifest = ops::generate(&root)?;
    let count = manifest.packages().count();
    if count == 0 {
        println!("Wrote {} (no packages found in .vendor)", DEFAULT_MANIFEST_PATH);
        return Ok(());
    }
    println!("Wrote {} with {} package(s):", DEFAULT_MANIFEST_PATH, count);
    for entry in manifest.packages() {
        println!("  {}", entry.import_path);
    }
    Ok(())
}

/// Show which packages trail their upstream
pub fn cmd_outdated(jobs: usize) -> Result<()> {
    let root = project_root()?;
    let vcs = GitCli::new()?;

    let opts = OutdatedOptions { jobs };
    let progress = ConsoleProgress::new();
    let entries = ops::outdated(&root, &vcs, &opts, &progress)?;
    if entries.is_empty() {
        println!("No packages in {}", DEFAULT_MANIFEST_PATH);
        return Ok(());
    }

    let mut behind = 0;
    for entry in &entries {
        match &entry.status {
            OutdatedStatus::Current { revision } => {
                println!("  {} up to date ({})", entry.import_path, short(revision));
            }
            OutdatedStatus::Outdated {
                local: Some(local),
                upstream,
            } => {
                behind += 1;
                println!("  {} {} -> {}", entry.import_path, short(local), short(upstream));
            }
            OutdatedStatus::Outdated {
                local: None,
                upstream,
            } => {
                behind += 1;
                println!("  {} not installed -> {}", entry.import_path, short(upstream));
            }
            OutdatedStatus::Unknown { error } => {
                println!("  {} unknown: {}", entry.import_path, error);
            }
        }
    }

    if behind == 0 {
        println!("\nAll packages are up to date");
    } else {
        println!("\n{} package(s) have updates available", behind);
    }
    Ok(())
}
