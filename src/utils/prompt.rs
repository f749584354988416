//! User interaction utilities
//!
//! The yes/no confirmation shown before an interactive upgrade, and the
//! version picker used when no target version was passed on the command
//! line.

use dialoguer::Select;
use std::io::{self, Write};

/// Prompt the user for confirmation with a yes/no question.
///
/// Returns `true` if the user confirms (Y/y/yes or empty for default yes),
/// `false` otherwise.
pub fn confirm(message: &str) -> io::Result<bool> {
    print!("{} [Y/n] ", message);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let response = response.trim().to_lowercase();

    Ok(response.is_empty() || response == "y" || response == "yes")
}

/// Let the user pick one entry from a list. The first item is the default.
pub fn pick<'a>(message: &str, items: &'a [String]) -> io::Result<&'a str> {
    let selection = Select::new()
        .with_prompt(message)
        .items(items)
        .default(0)
        .interact()
        .map_err(io::Error::other)?;

    Ok(&items[selection])
}
