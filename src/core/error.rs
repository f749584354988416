//! Failure taxonomy for the upgrade pipeline
//!
//! Every way a run can fail is a distinct variant carrying the data needed
//! to render it. The messages include the remediation steps the user needs,
//! since each of these is terminal for the run.

use crate::shell::ShellError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error(
        "Scripts cannot be executed on this system.\n\
         To fix, run the command below as Administrator in PowerShell and try again:\n\
         Set-ExecutionPolicy Unrestricted -Scope CurrentUser -Force"
    )]
    PolicyInsufficient,

    #[error("Encountered an error while checking the system's execution policy")]
    PolicyCheckFailed(#[source] ShellError),

    #[error("We have trouble connecting to the Internet. Aborting.")]
    NoInternet,

    #[error(
        "Given path {0} is not a valid directory.\n\
         Please ensure that you added the correct path and try again!"
    )]
    InvalidPath(String),

    #[error("Could not locate an npm installation directory on this system")]
    PathDiscoveryFailed,

    #[error(
        "npm cannot be upgraded without administrative rights. To run PowerShell as Administrator,\n\
         right-click PowerShell and select 'Run as Administrator'."
    )]
    AdminRequired,

    #[error("Could not determine npm version.")]
    VersionQueryFailed,

    #[error(
        "We could not show the latest available versions. Try running this script again \
         with the version you want to install (npm-windows-upgrade --npm-version 3.0.0)"
    )]
    VersionListUnavailable,

    #[error("You wanted to install npm {wanted}, but the installed version is {installed}")]
    VersionMismatch { wanted: String, installed: String },

    #[error("Failed to write the upgrade helper script to a temporary location")]
    Script(#[source] std::io::Error),

    #[error("Could not read user input")]
    Prompt(#[source] std::io::Error),

    #[error(transparent)]
    Shell(#[from] ShellError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_mismatch_message_names_both_versions() {
        let err = UpgradeError::VersionMismatch {
            wanted: "9.0.0".to_string(),
            installed: "8.1.0".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("9.0.0"));
        assert!(message.contains("8.1.0"));
    }

    #[test]
    fn test_invalid_path_message_names_the_path() {
        let err = UpgradeError::InvalidPath("C:\\missing".to_string());
        assert!(err.to_string().contains("C:\\missing"));
    }

    #[test]
    fn test_shell_errors_convert() {
        let shell_err = ShellError::Spawn {
            program: "powershell".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let err: UpgradeError = shell_err.into();
        assert!(matches!(err, UpgradeError::Shell(_)));
    }
}
