//! The upgrade orchestration pipeline
//!
//! A linear sequence of guarded steps: execution-policy check, connectivity
//! check, version selection, install-path discovery, then the elevated
//! upgrade script with verification and a plain `npm install -g` fallback.
//! Each step either passes its result forward or ends the run with a
//! specific [`UpgradeError`].

use crate::core::{UpgradeError, UpgradeRequest};
use crate::pathfinder;
use crate::probes;
use crate::shell::Shell;
use crate::utils::prompt;
use crate::utils::spinner::StatusSpinner;
use crate::versions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The elevation-capable helper script, embedded so an installed binary
/// has no sibling-file dependency. Materialized to a temp file per run.
const UPGRADE_SCRIPT: &str = include_str!("../assets/upgrade-npm.ps1");

/// First-line stdout signature the helper script emits when it could not
/// obtain administrative rights. The script has no structured output
/// channel, so this substring is the status code.
const ADMIN_REQUIRED_SIGNATURE: &str = "NOTADMIN";

/// Outcome of one install attempt, decided by post-hoc verification.
enum Attempt {
    /// Verified: the installed version now equals the requested one.
    Succeeded(String),
    /// Verification failed; carries the version actually installed.
    Mismatched(String),
}

pub struct Upgrader<S> {
    request: UpgradeRequest,
    shell: S,
}

impl<S: Shell> Upgrader<S> {
    pub fn new(request: UpgradeRequest, shell: S) -> Self {
        Self { request, shell }
    }

    /// Run the whole pipeline. `Ok(Some(version))` is a verified upgrade,
    /// `Ok(None)` means the user declined at the confirmation prompt.
    pub fn run(&self) -> Result<Option<String>, UpgradeError> {
        self.ensure_execution_policy()?;
        self.ensure_internet()?;

        let Some(target) = self.choose_version()? else {
            return Ok(None);
        };

        let install_path = self.choose_path()?;
        let installed = self.upgrade(&target, &install_path)?;
        Ok(Some(installed))
    }

    /// Scripts must be executable for the helper to run at all. A probe
    /// error is reported distinctly from an insufficient policy.
    fn ensure_execution_policy(&self) -> Result<(), UpgradeError> {
        if !self.request.execution_policy_check {
            return Ok(());
        }

        match probes::check_execution_policy(&self.shell, probes::DEFAULT_POLICY_ALLOWLIST) {
            Ok(true) => Ok(()),
            Ok(false) => Err(UpgradeError::PolicyInsufficient),
            Err(err) => Err(UpgradeError::PolicyCheckFailed(err)),
        }
    }

    fn ensure_internet(&self) -> Result<(), UpgradeError> {
        if probes::check_internet_connection(!self.request.dns_check) {
            Ok(())
        } else {
            Err(UpgradeError::NoInternet)
        }
    }

    /// Pin the target version: either the configured one, or an interactive
    /// pick from the registry list. "latest" resolves to a concrete version
    /// here and never changes afterwards. Returns `None` if the user bails.
    fn choose_version(&self) -> Result<Option<String>, UpgradeError> {
        let requested = match &self.request.npm_version {
            Some(version) => version.clone(),
            None => {
                if !prompt::confirm("This tool will upgrade npm. Do you want to continue?")
                    .map_err(UpgradeError::Prompt)?
                {
                    return Ok(None);
                }

                let mut available = versions::available_versions(&self.shell)?;
                // npm lists oldest first; show the newest at the top.
                available.reverse();
                prompt::pick("Which version do you want to install?", &available)
                    .map_err(UpgradeError::Prompt)?
                    .to_string()
            }
        };

        let target = versions::resolve_symbolic(&self.shell, &requested)?;
        log::debug!("Upgrader: pinned target version {}", target);
        Ok(Some(target))
    }

    fn choose_path(&self) -> Result<PathBuf, UpgradeError> {
        let resolution =
            pathfinder::find_install_path(&self.shell, self.request.npm_path.as_deref())?;

        self.log(&resolution.message);
        log::debug!("Upgrader: chosen npm path: {}", resolution.path.display());
        Ok(resolution.path)
    }

    /// Primary (elevated, path-targeted) attempt, then the global-install
    /// fallback. Admin failure is terminal immediately: the fallback needs
    /// the same rights, so retrying it would only fail the same way.
    fn upgrade(&self, target: &str, install_path: &Path) -> Result<String, UpgradeError> {
        log::debug!("Upgrader: starting upgrade to {}", target);

        let output = self.run_upgrade_script(target, install_path)?;
        if is_admin_required(&output.stdout) {
            return Err(UpgradeError::AdminRequired);
        }

        match self.verify(target)? {
            Attempt::Succeeded(installed) => return Ok(installed),
            Attempt::Mismatched(installed) => {
                log::debug!(
                    "Upgrader: script attempt left npm at {}, trying the fallback",
                    installed
                );
            }
        }

        self.run_simple_upgrade(target)?;

        match self.verify(target)? {
            Attempt::Succeeded(installed) => Ok(installed),
            Attempt::Mismatched(installed) => Err(UpgradeError::VersionMismatch {
                wanted: target.to_string(),
                installed,
            }),
        }
    }

    /// Exact string comparison against `npm -v`; no semver smarts.
    fn verify(&self, target: &str) -> Result<Attempt, UpgradeError> {
        let installed = versions::installed_version(&self.shell)?;
        if installed == target {
            Ok(Attempt::Succeeded(installed))
        } else {
            Ok(Attempt::Mismatched(installed))
        }
    }

    /// Primary strategy: the embedded PowerShell script, which elevates
    /// itself and installs into the resolved directory.
    fn run_upgrade_script(
        &self,
        version: &str,
        install_path: &Path,
    ) -> Result<crate::shell::ProcessOutput, UpgradeError> {
        let mut script = tempfile::Builder::new()
            .prefix("upgrade-npm")
            .suffix(".ps1")
            .tempfile()
            .map_err(UpgradeError::Script)?;
        script
            .write_all(UPGRADE_SCRIPT.as_bytes())
            .map_err(UpgradeError::Script)?;
        script.flush().map_err(UpgradeError::Script)?;

        let command = format!(
            "& {{& '{}' -version '{}' -NodePath \"{}\" }}",
            script.path().display(),
            version,
            install_path.display()
        );

        let spinner = StatusSpinner::start(
            "Upgrading npm...",
            self.request.spinner,
            self.request.quiet,
        );
        let result = self.shell.run(&command);
        spinner.finish();

        Ok(result?)
    }

    /// Fallback strategy: npm installing itself globally. No path
    /// targeting; this trades precision for a universally supported
    /// invocation.
    fn run_simple_upgrade(&self, version: &str) -> Result<(), UpgradeError> {
        let command = format!("npm install -g npm@{}", version);

        let spinner = StatusSpinner::start(
            "Upgrading npm (fallback method)...",
            self.request.spinner,
            self.request.quiet,
        );
        let result = self.shell.run(&command);
        spinner.finish();

        result?;
        Ok(())
    }

    fn log(&self, message: &str) {
        if !self.request.quiet {
            println!("{}", message);
        }
    }
}

/// Did the helper script report that it is not running elevated? Only the
/// first stdout line is a status line; later occurrences of the marker
/// would just be npm output quoting something.
fn is_admin_required(stdout: &[String]) -> bool {
    stdout
        .first()
        .map(|line| line.contains(ADMIN_REQUIRED_SIGNATURE))
        .unwrap_or(false)
}
