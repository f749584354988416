//! Installation path discovery
//!
//! Where should the upgrade land? Either the user told us, in which case
//! the directory just has to exist, or two probes are raced: PowerShell's
//! command binding for `npm` and npm's own global prefix. The probes can
//! disagree (a user-profile install without a co-located node_modules
//! fools the binding probe), so an on-disk existence check adjudicates.

use crate::core::UpgradeError;
use crate::shell::Shell;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

/// A wrapper-script binding means npm lives in a dedicated install
/// directory (e.g. C:\Program Files\nodejs\npm.cmd).
const WRAPPER_SUFFIX: &str = "npm.cmd";

/// Resolved install location plus an explanation of how it was chosen.
#[derive(Debug)]
pub struct PathResolution {
    pub path: PathBuf,
    pub message: String,
}

/// Resolve the directory the upgrade should target.
///
/// A user-supplied path is validated and never falls back to discovery.
pub fn find_install_path<S: Shell + ?Sized>(
    shell: &S,
    user_path: Option<&Path>,
) -> Result<PathResolution, UpgradeError> {
    match user_path {
        Some(path) => validate_user_path(path),
        None => discover(shell, npm_dir_present),
    }
}

fn validate_user_path(path: &Path) -> Result<PathResolution, UpgradeError> {
    let display = path.display().to_string();
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(PathResolution {
            path: path.to_path_buf(),
            message: format!("Given path {} is a valid directory.", display),
        }),
        _ => Err(UpgradeError::InvalidPath(display)),
    }
}

/// Run both probes to completion, then apply the priority rule. A failed
/// probe degrades to an absent answer rather than failing the resolution.
fn discover<S: Shell + ?Sized>(
    shell: &S,
    npm_dir_present: fn(&Path) -> bool,
) -> Result<PathResolution, UpgradeError> {
    let (from_powershell, from_npm) = thread::scope(|scope| {
        let binding = scope.spawn(|| probe_command_binding(shell));
        let prefix = scope.spawn(|| probe_global_prefix(shell));
        (
            binding.join().ok().flatten(),
            prefix.join().ok().flatten(),
        )
    });

    decide(from_powershell, from_npm, npm_dir_present)
}

/// Probe A: ask PowerShell where the `npm` command is bound. Only a clean
/// run that resolves to an `npm.cmd` wrapper counts; the wrapper's parent
/// is the installation directory.
fn probe_command_binding<S: Shell + ?Sized>(shell: &S) -> Option<PathBuf> {
    let output = shell
        .run("Get-Command npm | Select-Object -ExpandProperty Definition")
        .ok()?;

    if !output.stderr.is_empty() {
        log::debug!("Pathfinder: command binding probe produced stderr, ignoring it");
        return None;
    }

    let binding = output.stdout.first()?.trim();
    if !binding.ends_with(WRAPPER_SUFFIX) {
        log::debug!(
            "Pathfinder: command binding '{}' is not an {} wrapper",
            binding,
            WRAPPER_SUFFIX
        );
        return None;
    }

    let parent = Path::new(binding).parent()?.to_path_buf();
    log::debug!("Pathfinder: command binding probe found {}", parent.display());
    Some(parent)
}

/// Probe B: npm's own configured global prefix.
fn probe_global_prefix<S: Shell + ?Sized>(shell: &S) -> Option<PathBuf> {
    let output = shell.run("npm config --global get prefix").ok()?;
    let prefix = output
        .stdout
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())?;

    log::debug!("Pathfinder: global prefix probe found {}", prefix);
    Some(PathBuf::from(prefix))
}

/// Priority rule: the command-binding directory wins when an npm package
/// directory actually exists under it, then the prefix directory under the
/// same check, then the binding directory as an unconfirmed guess.
fn decide(
    from_powershell: Option<PathBuf>,
    from_npm: Option<PathBuf>,
    npm_dir_present: fn(&Path) -> bool,
) -> Result<PathResolution, UpgradeError> {
    let confirmed = |base: &Option<PathBuf>| {
        base.as_deref()
            .map(|p| npm_dir_present(&p.join("node_modules").join("npm")))
            .unwrap_or(false)
    };

    let ps_display = describe(&from_powershell);
    let npm_display = describe(&from_npm);
    let header = format!(
        "Checked system for npm installation:\n\
         According to PowerShell: {}\n\
         According to npm:        {}",
        ps_display, npm_display
    );

    if confirmed(&from_powershell) {
        let path = from_powershell.unwrap_or_default();
        let verdict = format!("Decided that npm is installed in {}", path.display());
        return Ok(PathResolution {
            path,
            message: format!("{}\n{}", header, verdict.green().bold()),
        });
    }

    if confirmed(&from_npm) {
        let path = from_npm.unwrap_or_default();
        let verdict = format!("Decided that npm is installed in {}", path.display());
        return Ok(PathResolution {
            path,
            message: format!("{}\n{}", header, verdict.green().bold()),
        });
    }

    if let Some(path) = from_powershell {
        let verdict = format!(
            "Decided that npm is not installed in either, but attempting to install in {}",
            path.display()
        );
        return Ok(PathResolution {
            path,
            message: format!("{}\n{}", header, verdict.green().bold()),
        });
    }

    if let Some(path) = from_npm {
        let verdict = format!(
            "Decided that npm is not installed in either, but attempting to install in {}",
            path.display()
        );
        return Ok(PathResolution {
            path,
            message: format!("{}\n{}", header, verdict.green().bold()),
        });
    }

    Err(UpgradeError::PathDiscoveryFailed)
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "(not found)".to_string(),
    }
}

fn npm_dir_present(path: &Path) -> bool {
    path.exists()
}
