//! Transient status indicator
//!
//! Wraps an indicatif spinner so callers don't care whether the animation
//! is enabled: with `--no-spinner` the message is printed once instead,
//! and `--quiet` suppresses it entirely.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct StatusSpinner {
    bar: Option<ProgressBar>,
}

impl StatusSpinner {
    pub fn start(message: &str, animate: bool, quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }

        if !animate {
            println!("{}", message);
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar: Some(bar) }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
