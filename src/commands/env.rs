// src/commands/env.rs
//! Commands that run other programs inside the vendor environment

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tracing::debug;

use bale::toolchain;
use bale::VendorTree;

use super::project_root;

/// Shell script installed as `~/.bale/shims/go`. Strips itself from
/// PATH before dispatching so the `go` it finds is the real one, and
/// applies the vendor environment only inside a bale project.
const SHIM_SCRIPT: &str = r#"#!/bin/bash

PATH=$(echo "$PATH" | sed -e "s|$HOME/.bale/shims:||g")

if [[ -n $(echo "$PATH" | grep .bale/shims) ]]; then
  echo bale warning: unable to remove shim from PATH, falling back to backup PATH
  PATH=/usr/local/bin:/usr/local/sbin:/usr/sbin:/usr/bin:/bin
fi

if [[ -f "Balefile" && -d ".vendor" ]]; then
  WD=$(pwd)
  GOPATH="$WD/.vendor/" GOBIN="$GOPATH/bin" PATH="$GOBIN:$PATH" go $@
else
  go $@
fi
"#;

/// Propagate a child's failure as our own exit code.
fn exit_with(status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        std::process::exit(status.code().unwrap_or(1));
    }
}

/// Run the go tool against the vendor environment
pub fn cmd_go(args: Vec<String>) -> Result<()> {
    let root = project_root()?;
    let tree = VendorTree::local(&root);

    let go = toolchain::go_binary()?;
    let status = toolchain::run_with_env(&go, &args, &tree)?;
    exit_with(status)
}

/// Run an arbitrary command against the vendor environment
pub fn cmd_exec(command: Vec<String>) -> Result<()> {
    let root = project_root()?;
    let tree = VendorTree::local(&root);

    let (program, args) = command.split_first().context("No command given")?;
    let status = toolchain::run_with_env(Path::new(program), args, &tree)?;
    exit_with(status)
}

/// Start an interactive shell with the vendor environment applied
pub fn cmd_shell() -> Result<()> {
    let root = project_root()?;
    let tree = VendorTree::local(&root);

    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
    println!("Starting bale shell ({})", shell);
    let status = toolchain::run_with_env(Path::new(&shell), &[], &tree)?;
    println!("Exiting bale shell");
    exit_with(status)
}

/// Install the go shim and print how to enable it
///
/// Any argument (conventionally `-`) switches the output to the bare
/// export line, for eval from a shell profile.
pub fn cmd_shim(args: Vec<String>) -> Result<()> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let shim_dir = home.join(".bale").join("shims");
    fs::create_dir_all(&shim_dir)
        .with_context(|| format!("Failed to create {}", shim_dir.display()))?;

    let shim_path = shim_dir.join("go");
    fs::write(&shim_path, SHIM_SCRIPT)
        .with_context(|| format!("Failed to write {}", shim_path.display()))?;
    let mut perms = fs::metadata(&shim_path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&shim_path, perms)?;
    debug!("Wrote shim to {}", shim_path.display());

    if args.is_empty() {
        println!("To have 'go' be automatically bale-aware, add this to .bash_profile or .zshrc:");
        println!();
        println!("if which bale > /dev/null; then eval \"$(bale shim -)\"; fi");
    } else {
        println!("export PATH={}:$PATH", shim_dir.display());
    }
    Ok(())
}
