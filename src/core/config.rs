//! Run configuration
//!
//! The parsed CLI is condensed into an [`UpgradeRequest`] once at startup
//! and handed to the upgrader by value. Nothing reads option state from
//! anywhere else.

use crate::cli::Cli;
use std::path::PathBuf;

/// Everything a single upgrade run needs to know, fixed at startup.
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    /// Version to install. `None` prompts the user; `"latest"` is resolved
    /// to a concrete version before the upgrade starts.
    pub npm_version: Option<String>,
    /// User-supplied install directory. `None` triggers auto-discovery.
    pub npm_path: Option<PathBuf>,
    /// Whether to run the DNS connectivity check.
    pub dns_check: bool,
    /// Whether to run the PowerShell execution-policy check.
    pub execution_policy_check: bool,
    /// Whether to animate a spinner while the helper scripts run.
    pub spinner: bool,
    /// Suppress informational output.
    pub quiet: bool,
}

impl UpgradeRequest {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.no_prompt {
            log::warn!("--no-prompt is deprecated, use --no-spinner instead");
        }

        Self {
            npm_version: cli.npm_version.clone(),
            npm_path: cli.npm_path.clone().map(PathBuf::from),
            dns_check: !cli.no_dns_check,
            execution_policy_check: !cli.no_execution_policy_check,
            spinner: !(cli.no_spinner || cli.no_prompt || cli.quiet),
            quiet: cli.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn request(args: &[&str]) -> UpgradeRequest {
        let mut argv = vec!["npm-windows-upgrade"];
        argv.extend_from_slice(args);
        UpgradeRequest::from_cli(&Cli::parse_from(argv))
    }

    #[test]
    fn test_defaults_enable_all_checks() {
        let req = request(&[]);
        assert!(req.dns_check);
        assert!(req.execution_policy_check);
        assert!(req.spinner);
        assert!(!req.quiet);
        assert!(req.npm_version.is_none());
        assert!(req.npm_path.is_none());
    }

    #[test]
    fn test_skip_flags_invert_into_checks() {
        let req = request(&["--no-dns-check", "--no-execution-policy-check"]);
        assert!(!req.dns_check);
        assert!(!req.execution_policy_check);
    }

    #[test]
    fn test_deprecated_no_prompt_disables_spinner() {
        let req = request(&["--no-prompt"]);
        assert!(!req.spinner);
    }

    #[test]
    fn test_quiet_disables_spinner() {
        let req = request(&["--quiet"]);
        assert!(!req.spinner);
        assert!(req.quiet);
    }

    #[test]
    fn test_version_and_path_pass_through() {
        let req = request(&["--npm-version", "9.6.7", "--npm-path", "C:\\nodejs"]);
        assert_eq!(req.npm_version.as_deref(), Some("9.6.7"));
        assert_eq!(req.npm_path.as_deref(), Some(std::path::Path::new("C:\\nodejs")));
    }
}
