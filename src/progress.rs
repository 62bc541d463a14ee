//! Terminal progress indicators shared by the commands

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for single-step phases ("Uploading HTML...").
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let spinner = ProgressBar::new_spinner()
        .with_style(style)
        .with_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Counted bar for per-image loops.
pub fn bar(message: impl Into<String>, len: u64) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} {elapsed}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    ProgressBar::new(len)
        .with_style(style)
        .with_message(message.into())
}

/// Whether phases should draw progress on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    #[default]
    Hidden,
    Terminal,
}

impl ProgressMode {
    pub fn spinner(self, message: impl Into<String>) -> ProgressBar {
        match self {
            ProgressMode::Hidden => ProgressBar::hidden(),
            ProgressMode::Terminal => spinner(message),
        }
    }

    pub fn bar(self, message: impl Into<String>, len: u64) -> ProgressBar {
        match self {
            ProgressMode::Hidden => ProgressBar::hidden(),
            ProgressMode::Terminal => bar(message, len),
        }
    }
}
