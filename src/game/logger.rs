//! Shared table logger
//!
//! One logger is shared by the scheduler worker and the presentation task,
//! so the capture buffer sits behind a `Mutex` instead of a `RefCell`.
//! Output settings are fixed at construction.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Verbosity level for table output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - round results only
    Minimal = 1,
    /// Normal - picks, discards and calls (default)
    #[default]
    Normal = 2,
    /// Verbose - every window, wall count and snapshot
    Verbose = 3,
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category (e.g. "anomaly", "controller_choice")
    pub category: Option<String>,
}

/// Read-only access to captured entries; holds the buffer lock
pub struct LogGuard<'a> {
    guard: MutexGuard<'a, Vec<LogEntry>>,
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct TableLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: Mutex<Vec<LogEntry>>,
}

impl TableLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        TableLogger {
            verbosity,
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            log_buffer: Mutex::new(Vec::new()),
        }
    }

    /// Capture-only logger for tests
    pub fn capturing(verbosity: VerbosityLevel) -> Self {
        Self::with_verbosity(verbosity).output_mode(OutputMode::Memory)
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // Poisoned buffers stay usable
        self.log_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Captured entries
    ///
    /// # Example
    /// ```ignore
    /// let anomalies = logger.logs().iter()
    ///     .filter(|e| e.category.as_deref() == Some("anomaly"))
    ///     .count();
    /// ```
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.buffer(),
        }
    }

    pub fn clear_logs(&self) {
        self.buffer().clear();
    }

    fn write_line(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Text => {
                if entry.level == VerbosityLevel::Minimal {
                    println!("{}", entry.message);
                } else {
                    println!("  {}", entry.message);
                }
            }
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("log serialization failed: {e}"),
            },
        }
    }

    fn record(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
            && level <= self.verbosity;

        if !should_capture && !should_output {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            category: category.map(str::to_string),
        };
        if should_output {
            self.write_line(&entry);
        }
        if should_capture {
            self.buffer().push(entry);
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.record(VerbosityLevel::Minimal, None, message);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.record(VerbosityLevel::Normal, None, message);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.record(VerbosityLevel::Verbose, None, message);
    }

    /// Expected-but-odd situations: rejected commands, stale inputs
    ///
    /// Echoed to stderr at verbose level so it never mixes with the
    /// deterministic stdout log.
    pub fn anomaly(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Verbose {
            eprintln!("  !!! {message}");
        }
        if self.is_capturing() {
            self.buffer().push(LogEntry {
                level: VerbosityLevel::Normal,
                message: message.to_string(),
                category: Some("anomaly".to_string()),
            });
        }
    }

    /// A seat's decision, in a format that does not depend on who decided
    pub fn controller_choice(&self, controller_name: &str, message: &str) {
        if self.verbosity >= VerbosityLevel::Verbose {
            eprintln!("  >>> {controller_name}: {message}");
        }
        self.record(VerbosityLevel::Normal, Some("controller_choice"), message);
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.logs()
            .iter()
            .filter(|e| e.category.as_deref() == Some(category))
            .count()
    }
}

impl Default for TableLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TableLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.buffer().len())
            .finish()
    }
}
