//! Single-line progress display for hashing runs.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// Progress line redrawn in place on a TTY, silent otherwise.
///
/// Renders as `Hashing photos: 40% (4/10)` and ends with `, done.`.
pub struct Progress {
    /// Label shown before the counts
    title: String,
    /// Number of items expected
    total: usize,
    /// Number of items completed
    current: usize,
    /// Whether anything is drawn at all
    enabled: bool,
    /// Percentage last drawn, to avoid redundant redraws
    last_percent: u8,
}

impl Progress {
    /// Creates a progress line; it is only drawn when stderr is a terminal.
    #[must_use]
    pub fn new(title: &str, total: usize) -> Self {
        Self::with_display(title, total, io::stderr().is_terminal())
    }

    /// Creates a progress line that never draws.
    #[must_use]
    pub fn hidden(title: &str, total: usize) -> Self {
        Self::with_display(title, total, false)
    }

    /// Shared constructor
    fn with_display(title: &str, total: usize, enabled: bool) -> Self {
        let progress = Self {
            title: title.to_string(),
            total,
            current: 0,
            enabled: enabled && total > 0,
            last_percent: 0,
        };
        progress.draw();
        progress
    }

    /// Marks one more item as done.
    pub fn tick(&mut self) {
        self.current = (self.current + 1).min(self.total);
        let percent = self.percent();
        if percent != self.last_percent {
            self.last_percent = percent;
            self.draw();
        }
    }

    /// Completes the line with a final `done.`.
    pub fn finish(mut self) {
        if self.enabled {
            eprintln!(
                "\r{}: 100% ({}/{}), done.",
                self.title.dimmed(),
                self.current,
                self.total
            );
        }
        self.enabled = false;
    }

    /// Completion in whole percent
    #[allow(clippy::cast_possible_truncation)]
    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.current * 100 / self.total) as u8
    }

    /// Redraw the line in place
    fn draw(&self) {
        if !self.enabled {
            return;
        }
        eprint!(
            "\r{}: {}% ({}/{})",
            self.title.dimmed(),
            self.percent(),
            self.current,
            self.total
        );
        let _ = io::stderr().flush();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        // Interrupted before finish(): move past the partial line
        if self.enabled {
            eprintln!();
        }
    }
}
