//! Diagnostic data for failure reports
//!
//! When an upgrade cannot be verified, the user is asked to file an issue.
//! This block gives them something useful to paste: the runtime, OS, and
//! tool versions. Every query is best-effort; a failing one contributes an
//! "unavailable" line instead of failing the report.

use crate::core::UpgradeError;
use crate::shell::Shell;
use colored::Colorize;

const UNAVAILABLE: &str = "(unavailable)";

/// Render the red failure epilogue: context-specific guidance plus the
/// debug block.
pub fn report_failure<S: Shell + ?Sized>(shell: &S, err: &UpgradeError) {
    let mut info = String::new();

    if let UpgradeError::VersionMismatch { .. } = err {
        info.push_str(
            "A common reason is an attempted \"npm install npm\" or \"npm upgrade npm\". \
             As of today, the only solution is to completely uninstall and then reinstall \
             Node.js. For a small tutorial, please see \
             https://github.com/felixrieseberg/npm-windows-upgrade#usage.\n",
        );
    }

    info.push_str("\nPlease consider reporting your trouble to https://aka.ms/npm-issues.");

    eprintln!("{}", info.red());
    eprintln!("{}", "\nDebug Information:\n".bold());
    eprintln!("{}", collect(shell));
}

/// One human-readable block of version facts.
pub fn collect<S: Shell + ?Sized>(shell: &S) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "npm-windows-upgrade: {}",
        env!("CARGO_PKG_VERSION")
    ));
    lines.push(format!("node: {}", query_line(shell, "node -v")));
    lines.push(format!("npm: {}", query_line(shell, "npm -v")));
    lines.push(format!("os: {}", windows_version(shell)));

    lines.join("\n")
}

fn query_line<S: Shell + ?Sized>(shell: &S, command: &str) -> String {
    shell
        .run(command)
        .ok()
        .and_then(|output| {
            output
                .stdout
                .iter()
                .map(|line| line.trim())
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

/// OS name and version, the way the original tooling gathered it.
fn windows_version<S: Shell + ?Sized>(shell: &S) -> String {
    let command = r#"systeminfo | findstr /B /C:"OS Name" /C:"OS Version""#;

    match shell.run(command) {
        Ok(output) if !output.stdout.is_empty() => output
            .stdout
            .iter()
            .map(|line| collapse_spaces(line.trim()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => UNAVAILABLE.to_string(),
    }
}

fn collapse_spaces(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
