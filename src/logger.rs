//! Diagnostic logging capability
//!
//! Transports report milestones (connected, authenticated, sent) as
//! plain text lines through an injected sink. The sink is a
//! capability handed in per call, never a global; callers that do not
//! care pass [`NullLogger`].

use std::sync::Mutex;

/// A sink for diagnostic lines emitted during a send.
pub trait Logger {
    fn log(&self, line: &str);
}

/// Discards every line. The default when no logger is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _line: &str) {}
}

/// Prints each line to standard output. Used by the test-send binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, line: &str) {
        println!("{line}");
    }
}

/// Collects lines in memory, for callers that display or inspect the
/// diagnostics afterwards.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("logger poisoned").clone()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, line: &str) {
        self.lines.lock().expect("logger poisoned").push(line.to_owned());
    }
}
