//! Structured findings produced while checking and resolving packaging options.
//!
//! Validation never logs-and-throws. Each check appends a [`Diagnostic`] to a
//! [`ValidationReport`], and the caller decides what to do with it: warnings
//! and non-fatal errors are logged, the first fatal entry aborts the pipeline.

use serde::Serialize;
use serde_json::Value;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A gap with a documented default; packaging continues.
    Warning,
    /// Logged at error severity but does not abort packaging.
    Error,
    /// Aborts the pipeline.
    Fatal,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity of the finding
    pub severity: Severity,
    /// Stable machine-readable identifier
    pub code: &'static str,
    /// Human-readable message, part of the observable contract
    pub message: String,
    /// Offending values (paths, publishers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Diagnostic {
    /// Creates a warning.
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates a non-fatal error.
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a fatal finding.
    pub fn fatal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, code, message)
    }

    fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attaches structured context.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether this finding aborts the pipeline.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// Ordered findings from one validation run.
///
/// Checks stop at the first fatal entry, so a report holds at most one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Findings in the order the checks ran
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// The fatal finding, if the run was aborted.
    pub fn fatal(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.is_fatal())
    }

    /// Whether any fatal finding was recorded.
    pub fn has_fatal(&self) -> bool {
        self.fatal().is_some()
    }

    /// Warning messages in order.
    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    /// Non-fatal error messages in order.
    pub fn errors(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    /// Whether a finding with `code` was recorded.
    pub fn contains(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    fn messages(&self, severity: Severity) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message.as_str())
            .collect()
    }

    /// Turns the report into an error if it holds a fatal finding.
    pub fn into_result(self) -> crate::error::Result<Self> {
        match self.fatal() {
            Some(fatal) => Err(fatal.clone().into()),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_surfaces_fatal_as_error() {
        let mut report = ValidationReport::new();
        report.push(Diagnostic::warning("w", "careful"));
        report.push(Diagnostic::fatal("f", "boom"));
        assert!(report.has_fatal());
        assert_eq!(report.warnings(), vec!["careful"]);
        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn report_without_fatal_passes_through() {
        let mut report = ValidationReport::new();
        report.push(Diagnostic::error("mismatch", "publisher differs"));
        let report = report.into_result().expect("non-fatal errors do not abort");
        assert_eq!(report.errors(), vec!["publisher differs"]);
        assert!(report.contains("mismatch"));
    }
}
