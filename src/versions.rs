//! npm version queries
//!
//! The installed version, the registry's version list, and the resolution
//! of the symbolic "latest" token. All queries go through npm itself; this
//! module only interprets the output.

use crate::core::UpgradeError;
use crate::shell::Shell;
use serde::Deserialize;

/// The reserved token that has to be resolved before the upgrade starts.
/// npm's own idea of "latest" at install time may differ from what the
/// user saw, so the concrete version is pinned up front.
pub const LATEST: &str = "latest";

/// `npm view <pkg> versions --json` yields an array, or a bare string when
/// exactly one version matches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionListing {
    Many(Vec<String>),
    One(String),
}

/// Currently installed npm version (`npm -v`).
pub fn installed_version<S: Shell + ?Sized>(shell: &S) -> Result<String, UpgradeError> {
    let output = shell.run("npm -v").map_err(|err| {
        log::debug!("Versions: npm -v failed: {}", err);
        UpgradeError::VersionQueryFailed
    })?;

    first_nonempty_line(&output.stdout).ok_or(UpgradeError::VersionQueryFailed)
}

/// All published npm versions, oldest first, from the registry.
pub fn available_versions<S: Shell + ?Sized>(shell: &S) -> Result<Vec<String>, UpgradeError> {
    let output = shell.run("npm view npm versions --json").map_err(|err| {
        log::debug!("Versions: registry version listing failed: {}", err);
        UpgradeError::VersionListUnavailable
    })?;

    let json = output.stdout.join("\n");
    let listing: VersionListing =
        serde_json::from_str(&json).map_err(|err| {
            log::debug!("Versions: could not parse version listing: {}", err);
            UpgradeError::VersionListUnavailable
        })?;

    Ok(match listing {
        VersionListing::Many(versions) => versions,
        VersionListing::One(version) => vec![version],
    })
}

/// The single newest published version (`npm show npm version`).
pub fn latest_version<S: Shell + ?Sized>(shell: &S) -> Result<String, UpgradeError> {
    let output = shell.run("npm show npm version").map_err(|err| {
        log::debug!("Versions: latest-version lookup failed: {}", err);
        UpgradeError::VersionListUnavailable
    })?;

    first_nonempty_line(&output.stdout).ok_or(UpgradeError::VersionListUnavailable)
}

/// Resolve "latest" to a concrete version; anything else passes through.
pub fn resolve_symbolic<S: Shell + ?Sized>(
    shell: &S,
    name: &str,
) -> Result<String, UpgradeError> {
    if name == LATEST {
        let resolved = latest_version(shell)?;
        log::debug!("Versions: resolved '{}' to {}", LATEST, resolved);
        Ok(resolved)
    } else {
        Ok(name.to_string())
    }
}

fn first_nonempty_line(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::testing::MockShell;

    #[test]
    fn test_installed_version_trims_output() {
        let shell = MockShell::new().on("npm -v", &["  6.14.4  "]);
        assert_eq!(installed_version(&shell).unwrap(), "6.14.4");
    }

    #[test]
    fn test_installed_version_failure_is_query_error() {
        let shell = MockShell::new().on_spawn_failure("npm -v");
        assert!(matches!(
            installed_version(&shell),
            Err(UpgradeError::VersionQueryFailed)
        ));
    }

    #[test]
    fn test_installed_version_empty_output_is_query_error() {
        let shell = MockShell::new().on("npm -v", &["", "  "]);
        assert!(matches!(
            installed_version(&shell),
            Err(UpgradeError::VersionQueryFailed)
        ));
    }

    #[test]
    fn test_available_versions_parses_json_array() {
        let shell = MockShell::new().on(
            "npm view npm versions --json",
            &["[", "  \"1.0.0\",", "  \"2.0.0\"", "]"],
        );
        assert_eq!(
            available_versions(&shell).unwrap(),
            vec!["1.0.0".to_string(), "2.0.0".to_string()]
        );
    }

    #[test]
    fn test_available_versions_accepts_single_string() {
        let shell = MockShell::new().on("npm view npm versions --json", &["\"9.8.1\""]);
        assert_eq!(available_versions(&shell).unwrap(), vec!["9.8.1".to_string()]);
    }

    #[test]
    fn test_available_versions_bad_json_is_list_unavailable() {
        let shell = MockShell::new().on("npm view npm versions --json", &["npm ERR! network"]);
        assert!(matches!(
            available_versions(&shell),
            Err(UpgradeError::VersionListUnavailable)
        ));
    }

    #[test]
    fn test_available_versions_command_failure_is_list_unavailable() {
        let shell = MockShell::new().on_spawn_failure("npm view npm versions --json");
        assert!(matches!(
            available_versions(&shell),
            Err(UpgradeError::VersionListUnavailable)
        ));
    }

    #[test]
    fn test_resolve_symbolic_passes_concrete_versions_through() {
        // Nothing is scripted: any shell call would fail, proving that a
        // concrete version performs no lookup.
        let shell = MockShell::new();
        assert_eq!(resolve_symbolic(&shell, "3.10.2").unwrap(), "3.10.2");
        assert!(shell.calls().is_empty());
    }

    #[test]
    fn test_resolve_symbolic_resolves_latest() {
        let shell = MockShell::new().on("npm show npm version", &["10.1.0"]);
        assert_eq!(resolve_symbolic(&shell, "latest").unwrap(), "10.1.0");
    }

    #[test]
    fn test_resolve_symbolic_is_idempotent_over_resolved_versions() {
        let shell = MockShell::new().on("npm show npm version", &["10.1.0"]);
        let once = resolve_symbolic(&shell, "latest").unwrap();
        let twice = resolve_symbolic(&shell, &once).unwrap();
        assert_eq!(once, twice);
    }
}
