//! Logging Capability
//!
//! Resource-layer components never talk to a global logger. Each one receives
//! a [`Logger`] at construction and reports through it, which keeps
//! diagnostics observable in tests and lets embedders route them wherever
//! they want.
//!
//! # Sinks
//!
//! - [`FacadeSink`] forwards to the `log` crate facade (the default).
//! - [`FileSink`] writes prefixed lines to a log file, truncating it on the
//!   first write of the process and appending afterwards.
//! - [`MemorySink`] captures lines for assertions in tests.
//!
//! All sinks serialize concurrent writers, so interleaved messages never
//! corrupt each other.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

// ─── Severity ─────────────────────────────────────────────────────────────────

/// Message severity, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Line prefix used by [`FileSink`].
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Info => "Info:",
            Self::Warning => "Warning:",
            Self::Error => "Error:",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

// ─── Sink trait and logger handle ─────────────────────────────────────────────

/// Receives log lines from resource-layer components.
pub trait LogSink: Send + Sync {
    fn log(&self, severity: Severity, message: &str);
}

/// Cheap, cloneable handle to a [`LogSink`].
#[derive(Clone)]
pub struct Logger(Arc<dyn LogSink>);

impl Logger {
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self(sink)
    }

    pub fn log(&self, severity: Severity, message: &str) {
        self.0.log(severity, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }
}

impl Default for Logger {
    /// A logger backed by [`FacadeSink`].
    fn default() -> Self {
        Self::new(Arc::new(FacadeSink))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}

// ─── Provided sinks ───────────────────────────────────────────────────────────

/// Forwards every line to the `log` crate facade under the `rhea` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!(target: "rhea", "{message}"),
            Severity::Warning => log::warn!(target: "rhea", "{message}"),
            Severity::Error => log::error!(target: "rhea", "{message}"),
        }
    }
}

/// Writes prefixed lines to a log file.
///
/// The first write truncates the file so every run starts with a fresh log;
/// later writes append. All writes go through one mutex.
pub struct FileSink {
    path: PathBuf,
    state: Mutex<FileState>,
}

struct FileState {
    truncated: bool,
    write_failed: bool,
}

impl FileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(FileState {
                truncated: false,
                write_failed: false,
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self, truncated: bool) -> std::io::Result<File> {
        if truncated {
            OpenOptions::new().append(true).open(&self.path)
        } else {
            File::create(&self.path)
        }
    }
}

impl LogSink for FileSink {
    fn log(&self, severity: Severity, message: &str) {
        let mut state = self.state.lock();
        let result = self
            .open(state.truncated)
            .and_then(|mut file| writeln!(file, "{} {message}", severity.prefix()));
        match result {
            Ok(()) => state.truncated = true,
            Err(err) => {
                // Report the first failure through the facade, then go quiet.
                if !state.write_failed {
                    state.write_failed = true;
                    log::error!(target: "rhea", "log file {} unwritable: {err}", self.path.display());
                }
            }
        }
    }
}

/// Captures log lines in memory for later inspection.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line captured so far.
    #[must_use]
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().clone()
    }

    /// Whether any captured line of `severity` contains `fragment`.
    #[must_use]
    pub fn contains(&self, severity: Severity, fragment: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(s, m)| *s == severity && m.contains(fragment))
    }

    /// Number of captured lines of the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.lock().iter().filter(|(s, _)| *s == severity).count()
    }
}

impl LogSink for MemorySink {
    fn log(&self, severity: Severity, message: &str) {
        self.entries.lock().push((severity, message.to_owned()));
    }
}
