//! Diagnostics reporting for the compiler pipeline.
//!
//! Compiler stages never talk to the global logger directly; every stage
//! reports through a `Diagnostics` sink handed in by the caller. The
//! production sink forwards to the `log` macros, tests capture messages
//! and assert on them.

use log::{debug, error, info};

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Error,
    /// Reserved for the final command echo, which must reach the operator
    /// at any log level.
    Critical,
}

/// Receiver for compiler diagnostics.
pub trait Diagnostics {
    fn report(&mut self, severity: Severity, message: &str);
}

/// Production sink backed by the `log` crate.
///
/// `log` has no level above error, so both `Error` and `Critical` map to
/// `log::error!`.
#[derive(Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => debug!("{}", message),
            Severity::Info => info!("{}", message),
            Severity::Error | Severity::Critical => error!("{}", message),
        }
    }
}

/// Capturing sink for tests.
#[derive(Debug, Default)]
pub struct CapturedDiagnostics {
    pub messages: Vec<(Severity, String)>,
}

impl CapturedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, message)| message.contains(needle))
    }

    /// All messages captured at `severity`.
    pub fn at(&self, severity: Severity) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, message)| message.as_str())
            .collect()
    }
}

impl Diagnostics for CapturedDiagnostics {
    fn report(&mut self, severity: Severity, message: &str) {
        self.messages.push((severity, message.to_string()));
    }
}
