//! ui::output
//!
//! User-facing messages.
//!
//! # Design
//!
//! Everything the engine wants to tell the user goes through the
//! [`Reporter`] trait instead of printing directly. The CLI hands in a
//! [`ConsoleReporter`]; tests hand in a [`RecordingReporter`] and assert on
//! what was said. Diagnostics for developers use `tracing`, not this.

use std::sync::{Mutex, PoisonError};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - warnings and errors only
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Sink for user-facing messages.
pub trait Reporter: Send + Sync {
    /// Something completed.
    fn success(&self, message: &str);
    /// Neutral progress or context.
    fn info(&self, message: &str);
    /// Something the user should notice but that does not stop the run.
    fn warn(&self, message: &str);
    /// Something failed.
    fn error(&self, message: &str);
    /// Extra detail shown only in verbose mode.
    fn debug(&self, message: &str);
}

/// Reporter that writes to the terminal.
///
/// Info and success go to stdout; warnings, errors and debug detail go to
/// stderr so piping stdout stays clean.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    verbosity: Verbosity,
}

impl ConsoleReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl Reporter for ConsoleReporter {
    fn success(&self, message: &str) {
        if self.verbosity != Verbosity::Quiet {
            println!("✓ {}", message);
        }
    }

    fn info(&self, message: &str) {
        if self.verbosity != Verbosity::Quiet {
            println!("{}", message);
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn debug(&self, message: &str) {
        if self.verbosity == Verbosity::Debug {
            eprintln!("[debug] {}", message);
        }
    }
}

/// Message severity, as captured by [`RecordingReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warn,
    Error,
    Debug,
}

/// Reporter that remembers every message.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, in order.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of one level.
    pub fn at(&self, level: Level) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|(_, m)| m.contains(needle))
    }

    fn push(&self, level: Level, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

impl Reporter for RecordingReporter {
    fn success(&self, message: &str) {
        self.push(Level::Success, message);
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }
}
