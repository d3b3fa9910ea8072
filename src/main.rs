// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Install {
            packages,
            save,
            global,
            force,
            check_upstream,
            locked,
            jobs,
            no_build,
        }) => commands::cmd_install(
            packages,
            save,
            global,
            force,
            check_upstream,
            locked,
            jobs,
            no_build,
        ),
        Some(Commands::Update {
            packages,
            save,
            global,
            check_upstream,
            locked,
            jobs,
            no_build,
        }) => commands::cmd_update(packages, save, global, check_upstream, locked, jobs, no_build),
        Some(Commands::Uninstall {
            packages,
            save,
            global,
        }) => commands::cmd_uninstall(packages, save, global),
        Some(Commands::Prune) => commands::cmd_prune(),
        Some(Commands::Outdated { jobs }) => commands::cmd_outdated(jobs),
        Some(Commands::Lock) => commands::cmd_lock(),
        Some(Commands::Generate) => commands::cmd_generate(),
        Some(Commands::Go { args }) => commands::cmd_go(args),
        Some(Commands::Exec { command }) => commands::cmd_exec(command),
        Some(Commands::Shell) => commands::cmd_shell(),
        Some(Commands::Shim { args }) => commands::cmd_shim(args),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "bale", &mut std::io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("Bale v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'bale --help' for usage information");
            Ok(())
        }
    }
}
