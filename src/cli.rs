// src/cli.rs
//! CLI definitions for the bale package manager
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use bale::ops::DEFAULT_JOBS;

#[derive(Parser)]
#[command(name = "bale")]
#[command(author = "Bale Contributors")]
#[command(version)]
#[command(about = "Project-local dependency management for GOPATH-era Go", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install packages into the vendor tree
    ///
    /// With no arguments, installs everything the Balefile lists.
    /// Explicit packages may carry an @constraint suffix, for example
    /// acme/widget@v1.2.0 or acme/widget@7f3acd9.
    Install {
        /// Packages to install (owner/repo shorthand or full import path)
        packages: Vec<String>,

        /// Record the packages in the Balefile afterwards
        #[arg(long)]
        save: bool,

        /// Install into $GOPATH instead of the project vendor tree
        #[arg(short = 'g', long)]
        global: bool,

        /// Refetch refs and move packages even when already present
        #[arg(long)]
        force: bool,

        /// Refresh a package only when its upstream tip has moved
        #[arg(long)]
        check_upstream: bool,

        /// Prefer revisions recorded in Balefile.lock
        #[arg(long)]
        locked: bool,

        /// Concurrent fetches
        #[arg(long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,

        /// Skip running `go install` for fetched packages
        #[arg(long)]
        no_build: bool,
    },

    /// Update packages to their newest matching revision
    ///
    /// Same as install, but present packages are refreshed instead of
    /// left alone.
    Update {
        /// Packages to update; all manifest packages when omitted
        packages: Vec<String>,

        /// Record the packages in the Balefile afterwards
        #[arg(long)]
        save: bool,

        /// Update in $GOPATH instead of the project vendor tree
        #[arg(short = 'g', long)]
        global: bool,

        /// Refresh a package only when its upstream tip has moved
        #[arg(long)]
        check_upstream: bool,

        /// Prefer revisions recorded in Balefile.lock
        #[arg(long)]
        locked: bool,

        /// Concurrent fetches
        #[arg(long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,

        /// Skip running `go install` for fetched packages
        #[arg(long)]
        no_build: bool,
    },

    /// Remove packages from the vendor tree
    Uninstall {
        /// Packages to remove
        #[arg(required = true)]
        packages: Vec<String>,

        /// Drop the packages from the Balefile afterwards
        #[arg(long)]
        save: bool,

        /// Remove from $GOPATH instead of the project vendor tree
        #[arg(short = 'g', long)]
        global: bool,
    },

    /// Delete vendored packages the Balefile no longer lists
    Prune,

    /// Show which packages trail their upstream
    Outdated {
        /// Concurrent upstream queries
        #[arg(long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,
    },

    /// Pin every manifest package at its installed revision
    Lock,

    /// Create a Balefile from an existing vendor tree
    Generate,

    /// Run the go tool against the vendor environment
    Go {
        /// Arguments passed through to `go`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run an arbitrary command against the vendor environment
    Exec {
        /// Command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Start a shell with the vendor environment applied
    Shell,

    /// Install the bale-aware `go` shim
    ///
    /// Prints setup instructions; `bale shim -` prints the PATH export
    /// line for use with eval in a shell profile.
    Shim {
        /// Pass `-` to print the eval-ready export line
        args: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
