// Copyright (c) 2021 Fabian Schuiki

//! Utilities to implement diagnostics and error reporting facilities.

use crate::source::Location;
use std::fmt;
use std::sync::Mutex;

/// The severity of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
    Bug,
}

impl Severity {
    pub fn to_str(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Bug => "internal error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A diagnostic message together with the input location it refers to.
///
/// Diagnostics are assembled in a builder fashion and then handed to a
/// [`MessageLog`]. They are never thrown across stage boundaries.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub loc: Option<Location>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(severity: Severity, message: S) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.into(),
            loc: None,
            notes: Vec::new(),
        }
    }

    pub fn note<S: Into<String>>(message: S) -> Diagnostic {
        Diagnostic::new(Severity::Note, message)
    }

    pub fn warning<S: Into<String>>(message: S) -> Diagnostic {
        Diagnostic::new(Severity::Warning, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Diagnostic {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn fatal<S: Into<String>>(message: S) -> Diagnostic {
        Diagnostic::new(Severity::Fatal, message)
    }

    /// Attach the input location the diagnostic refers to.
    pub fn at(self, loc: Location) -> Diagnostic {
        Diagnostic {
            loc: Some(loc),
            ..self
        }
    }

    /// Attach an additional note to the diagnostic.
    pub fn add_note<S: Into<String>>(mut self, message: S) -> Diagnostic {
        self.notes.push(message.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(loc) = self.loc {
            write!(f, "\n  --> {}", loc)?;
        }
        for note in &self.notes {
            write!(f, "\n   = note: {}", note)?;
        }
        Ok(())
    }
}

/// A shared log of diagnostic messages.
///
/// All pipeline stages report into one log; the log is therefore safe to share
/// across threads. Records come out in the order they were added.
#[derive(Debug, Default)]
pub struct MessageLog {
    records: Mutex<Vec<Diagnostic>>,
}

impl MessageLog {
    pub fn new() -> MessageLog {
        Default::default()
    }

    /// Add a diagnostic to the log.
    pub fn add(&self, diag: Diagnostic) {
        self.records.lock().unwrap().push(diag);
    }

    /// Return a copy of all records added so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.lock().unwrap().clone()
    }

    /// The highest severity recorded so far, if any.
    pub fn severity(&self) -> Option<Severity> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.severity)
            .max()
    }

    /// Check whether anything of severity [`Severity::Error`] or above has
    /// been recorded.
    pub fn has_errors(&self) -> bool {
        self.severity().map(|s| s >= Severity::Error).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render() {
        let d = Diagnostic::error("expected `;`")
            .at(Location::new(3, 14))
            .add_note("statements are terminated explicitly");
        assert_eq!(
            format!("{}", d),
            "error: expected `;`\n  --> 3:14\n   = note: statements are terminated explicitly"
        );
    }

    #[test]
    fn log_severity() {
        let log = MessageLog::new();
        assert_eq!(log.severity(), None);
        assert!(!log.has_errors());
        log.add(Diagnostic::warning("odd input"));
        assert!(!log.has_errors());
        log.add(Diagnostic::error("bad input"));
        assert_eq!(log.severity(), Some(Severity::Error));
        assert!(log.has_errors());
        assert_eq!(log.records().len(), 2);
    }
}
