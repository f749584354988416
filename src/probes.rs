//! Environment probes run before the upgrade is allowed to start
//!
//! Two yes/no questions: is the network reachable, and is PowerShell
//! allowed to execute scripts. Both are heuristics over unstructured
//! system output, so the matching rules live in small standalone
//! functions that can be adjusted if the output format ever changes.

use crate::shell::{Shell, ShellError};
use std::io;
use std::net::ToSocketAddrs;

/// Stable hostname used for the connectivity lookup.
const CONNECTIVITY_HOST: &str = "microsoft.com";

/// Execution-policy names that permit running the upgrade script. Earlier
/// versions of this tool accepted only `Unrestricted`, which turned out to
/// reject perfectly workable systems.
pub const DEFAULT_POLICY_ALLOWLIST: &[&str] = &["Unrestricted", "RemoteSigned", "Bypass"];

/// Connectivity heuristic: resolve a well-known hostname.
///
/// Fails open: only an explicit host-not-found result counts as offline.
/// Transient resolver trouble should not block an upgrade that npm itself
/// may well manage to perform.
pub fn check_internet_connection(skip: bool) -> bool {
    if skip {
        log::debug!("Probes: DNS check skipped by configuration");
        return true;
    }

    match (CONNECTIVITY_HOST, 443u16).to_socket_addrs() {
        Ok(_) => true,
        Err(err) => {
            log::debug!("Probes: DNS lookup of {} failed: {}", CONNECTIVITY_HOST, err);
            !is_host_not_found(&err)
        }
    }
}

/// Does this resolver error mean "the name does not exist", as opposed to
/// a transient failure?
///
/// Windows reports WSAHOST_NOT_FOUND (11001) or WSANO_DATA (11004) as the
/// raw OS error; getaddrinfo-based platforms surface EAI_NONAME only in the
/// error text, so both are checked.
fn is_host_not_found(err: &io::Error) -> bool {
    if matches!(err.raw_os_error(), Some(11001) | Some(11004)) {
        return true;
    }

    let text = err.to_string();
    text.contains("No such host is known")
        || text.contains("Name or service not known")
        || text.contains("nodename nor servname provided")
}

/// Ask PowerShell for its execution policy and decide whether scripts can
/// run. A shell failure here is a real error, not a "no".
pub fn check_execution_policy<S: Shell + ?Sized>(
    shell: &S,
    allowed: &[&str],
) -> Result<bool, ShellError> {
    log::debug!("Probes: checking execution policy");
    let output = shell.run("Get-ExecutionPolicy")?;
    Ok(policy_allows(output.all_lines(), allowed))
}

/// True iff any allow-listed policy name appears anywhere in the output.
/// Stderr counts too: some hosts print the policy there when profiles
/// misbehave.
pub fn policy_allows<'a, I>(lines: I, allowed: &[&str]) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .any(|line| allowed.iter().any(|name| line.contains(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::testing::MockShell;
    use crate::shell::ProcessOutput;

    #[test]
    fn test_policy_allows_any_allowlisted_name() {
        for policy in ["Unrestricted", "RemoteSigned", "Bypass"] {
            assert!(
                policy_allows([policy], DEFAULT_POLICY_ALLOWLIST),
                "{} should be allowed",
                policy
            );
        }
    }

    #[test]
    fn test_policy_rejects_restricted() {
        assert!(!policy_allows(["Restricted"], DEFAULT_POLICY_ALLOWLIST));
        assert!(!policy_allows(["AllSigned"], DEFAULT_POLICY_ALLOWLIST));
        assert!(!policy_allows(Vec::<&str>::new(), DEFAULT_POLICY_ALLOWLIST));
    }

    #[test]
    fn test_policy_match_is_position_independent() {
        let lines = ["some banner", "policy: RemoteSigned (effective)"];
        assert!(policy_allows(lines, DEFAULT_POLICY_ALLOWLIST));
    }

    #[test]
    fn test_policy_respects_custom_allowlist() {
        assert!(!policy_allows(["RemoteSigned"], &["Unrestricted"]));
        assert!(policy_allows(["Unrestricted"], &["Unrestricted"]));
    }

    #[test]
    fn test_check_execution_policy_scans_stderr_too() {
        let shell = MockShell::new().on_output(
            "Get-ExecutionPolicy",
            ProcessOutput {
                stdout: vec![],
                stderr: vec!["Bypass".to_string()],
            },
        );
        assert!(check_execution_policy(&shell, DEFAULT_POLICY_ALLOWLIST).unwrap());
    }

    #[test]
    fn test_check_execution_policy_false_when_restricted() {
        let shell = MockShell::new().on("Get-ExecutionPolicy", &["Restricted"]);
        assert!(!check_execution_policy(&shell, DEFAULT_POLICY_ALLOWLIST).unwrap());
    }

    #[test]
    fn test_check_execution_policy_spawn_failure_is_an_error() {
        let shell = MockShell::new().on_spawn_failure("Get-ExecutionPolicy");
        assert!(check_execution_policy(&shell, DEFAULT_POLICY_ALLOWLIST).is_err());
    }

    #[test]
    fn test_internet_check_skip_short_circuits() {
        assert!(check_internet_connection(true));
    }

    #[test]
    fn test_host_not_found_detection() {
        let not_found = io::Error::from_raw_os_error(11001);
        assert!(is_host_not_found(&not_found));

        let no_data = io::Error::from_raw_os_error(11004);
        assert!(is_host_not_found(&no_data));

        let eai_noname = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        );
        assert!(is_host_not_found(&eai_noname));

        let transient = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Temporary failure in name resolution",
        );
        assert!(!is_host_not_found(&transient));

        let timeout = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert!(!is_host_not_found(&timeout));
    }
}
