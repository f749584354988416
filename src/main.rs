//! npm-windows-upgrade - upgrade npm in place on Windows

mod cli;
mod core;
mod diagnostics;
mod pathfinder;
mod probes;
mod shell;
mod upgrader;
mod utils;
mod versions;

use cli::Cli;
use colored::Colorize;
use crate::core::{UpgradeError, UpgradeRequest};
use shell::PowerShell;
use upgrader::Upgrader;

fn main() {
    // Parse CLI arguments first: the logger's filter level is fixed at
    // init time, so --verbose has to be known before building it.
    let cli = Cli::parse_args();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .init();

    let request = UpgradeRequest::from_cli(&cli);

    if !request.quiet {
        println!("npm-windows-upgrade v{}", env!("CARGO_PKG_VERSION"));
    }

    let powershell = PowerShell::new();
    let upgrader = Upgrader::new(request, powershell);

    match upgrader.run() {
        Ok(Some(installed)) => {
            println!(
                "{}",
                format!(
                    "Upgrade finished. Your new npm version is {}. Have a nice day!",
                    installed
                )
                .green()
                .bold()
            );
        }
        Ok(None) => {
            // User declined the confirmation prompt.
            println!(
                "{}",
                "Well then, we're done here. Have a nice day!".green().bold()
            );
        }
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);

            // Unverifiable upgrades get the full bug-report block.
            if matches!(err, UpgradeError::VersionMismatch { .. }) {
                diagnostics::report_failure(&PowerShell::new(), &err);
            }

            std::process::exit(1);
        }
    }
}
