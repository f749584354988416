//! CLI argument parsing

use clap::Parser;

#[derive(Parser)]
#[command(name = "npm-windows-upgrade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upgrade npm on Windows", long_about = None)]
pub struct Cli {
    /// Upgrade/downgrade npm to the specified version (or "latest")
    #[arg(short = 'v', long)]
    pub npm_version: Option<String>,

    /// Upgrade npm in the specified location instead of auto-detecting it
    #[arg(short = 'n', long)]
    pub npm_path: Option<String>,

    /// Disable the internet connectivity test
    #[arg(short = 'd', long)]
    pub no_dns_check: bool,

    /// Disable the PowerShell execution policy test
    #[arg(short = 'e', long)]
    pub no_execution_policy_check: bool,

    /// Disable the spinner animation
    #[arg(short = 'p', long)]
    pub no_spinner: bool,

    /// [Deprecated] Use --no-spinner instead
    #[arg(long, hide = true)]
    pub no_prompt: bool,

    /// No output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level for this run; `--verbose` enables the debug trail.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
