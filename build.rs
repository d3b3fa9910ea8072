// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: record the result in the Balefile
fn save_arg() -> Arg {
    Arg::new("save")
        .long("save")
        .action(ArgAction::SetTrue)
        .help("Record the packages in the Balefile afterwards")
}

/// Common argument: operate on $GOPATH instead of the project tree
fn global_arg() -> Arg {
    Arg::new("global")
        .short('g')
        .long("global")
        .action(ArgAction::SetTrue)
        .help("Operate on $GOPATH instead of the project vendor tree")
}

/// Common argument: worker count
fn jobs_arg() -> Arg {
    Arg::new("jobs")
        .long("jobs")
        .value_name("N")
        .default_value("4")
        .help("Concurrent fetches")
}

fn build_cli() -> Command {
    Command::new("bale")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Bale Contributors")
        .about("Project-local dependency management for GOPATH-era Go")
        .subcommand_required(false)
        .subcommand(
            Command::new("install")
                .about("Install packages into the vendor tree")
                .arg(Arg::new("packages").num_args(0..).help("Packages to install"))
                .arg(save_arg())
                .arg(global_arg())
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Refetch refs and move packages even when already present"),
                )
                .arg(
                    Arg::new("check_upstream")
                        .long("check-upstream")
                        .action(ArgAction::SetTrue)
                        .help("Refresh a package only when its upstream tip has moved"),
                )
                .arg(
                    Arg::new("locked")
                        .long("locked")
                        .action(ArgAction::SetTrue)
                        .help("Prefer revisions recorded in Balefile.lock"),
                )
                .arg(jobs_arg())
                .arg(
                    Arg::new("no_build")
                        .long("no-build")
                        .action(ArgAction::SetTrue)
                        .help("Skip running `go install` for fetched packages"),
                ),
        )
        .subcommand(
            Command::new("update")
                .about("Update packages to their newest matching revision")
                .arg(Arg::new("packages").num_args(0..).help("Packages to update"))
                .arg(save_arg())
                .arg(global_arg())
                .arg(jobs_arg()),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Remove packages from the vendor tree")
                .arg(Arg::new("packages").required(true).num_args(1..).help("Packages to remove"))
                .arg(save_arg())
                .arg(global_arg()),
        )
        .subcommand(
            Command::new("prune").about("Delete vendored packages the Balefile no longer lists"),
        )
        .subcommand(
            Command::new("outdated")
                .about("Show which packages trail their upstream")
                .arg(jobs_arg()),
        )
        .subcommand(
            Command::new("lock").about("Pin every manifest package at its installed revision"),
        )
        .subcommand(
            Command::new("generate").about("Create a Balefile from an existing vendor tree"),
        )
        .subcommand(
            Command::new("go")
                .about("Run the go tool against the vendor environment")
                .arg(Arg::new("args").num_args(0..).allow_hyphen_values(true)),
        )
        .subcommand(
            Command::new("exec")
                .about("Run an arbitrary command against the vendor environment")
                .arg(Arg::new("command").required(true).num_args(1..).allow_hyphen_values(true)),
        )
        .subcommand(
            Command::new("shell").about("Start a shell with the vendor environment applied"),
        )
        .subcommand(
            Command::new("shim")
                .about("Install the bale-aware `go` shim")
                .arg(Arg::new("args").num_args(0..)),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("bale.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
        return;
    }

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
