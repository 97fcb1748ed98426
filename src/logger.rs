//! Per-invocation logger.
//!
//! Each packaging run owns a [`PackagingLogger`] configured from its own
//! [`LogLevel`]; there is no process-wide verbosity state. Visible messages
//! are forwarded to the `log` facade, with structured context rendered as
//! pretty JSON underneath the message.

use crate::diagnostic::{Diagnostic, Severity};
use crate::settings::LogLevel;
use serde::Serialize;

const TARGET: &str = "msix_packager";

/// Logger threaded through the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackagingLogger {
    debug: bool,
    show_warnings: bool,
}

impl PackagingLogger {
    /// Creates a logger for the given level.
    ///
    /// `debug` shows everything, `warn` adds warnings to errors and info,
    /// no level shows only errors and info.
    pub fn new(level: Option<LogLevel>) -> Self {
        Self {
            debug: level == Some(LogLevel::Debug),
            show_warnings: level == Some(LogLevel::Warn),
        }
    }

    /// Whether debug output is enabled.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Whether warnings are shown.
    pub fn shows_warnings(&self) -> bool {
        self.debug || self.show_warnings
    }

    /// Debug message, shown only at `debug`.
    pub fn debug(&self, message: &str) {
        if self.debug {
            log::debug!(target: TARGET, "{}", message);
        }
    }

    /// Debug message with structured context.
    pub fn debug_with<T: Serialize + ?Sized>(&self, message: &str, context: &T) {
        if self.debug {
            log::debug!(target: TARGET, "{}\n{}", message, render(context));
        }
    }

    /// Info message, always shown.
    pub fn info(&self, message: &str) {
        log::info!(target: TARGET, "{}", message);
    }

    /// Warning, shown at `warn` or `debug`.
    pub fn warn(&self, message: &str) {
        if self.shows_warnings() {
            log::warn!(target: TARGET, "{}", message);
        }
    }

    /// Error message, always shown.
    pub fn error(&self, message: &str) {
        log::error!(target: TARGET, "{}", message);
    }

    /// Error message with structured context.
    pub fn error_with<T: Serialize + ?Sized>(&self, message: &str, context: &T) {
        log::error!(target: TARGET, "{}\n{}", message, render(context));
    }

    /// Logs a diagnostic at the level matching its severity.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        let rendered = match &diagnostic.context {
            Some(context) => format!("{}\n{}", diagnostic.message, render(context)),
            None => diagnostic.message.clone(),
        };
        match diagnostic.severity {
            Severity::Warning => {
                if self.shows_warnings() {
                    log::warn!(target: TARGET, "{}", rendered);
                }
            }
            Severity::Error | Severity::Fatal => log::error!(target: TARGET, "{}", rendered),
        }
    }
}

fn render<T: Serialize + ?Sized>(context: &T) -> String {
    let json = serde_json::to_string_pretty(context).unwrap_or_else(|e| format!("<{e}>"));
    json.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_level_enables_debug_and_warnings() {
        let logger = PackagingLogger::new(Some(LogLevel::Debug));
        assert!(logger.is_debug());
        assert!(logger.shows_warnings());
    }

    #[test]
    fn warn_level_enables_only_warnings() {
        let logger = PackagingLogger::new(Some(LogLevel::Warn));
        assert!(!logger.is_debug());
        assert!(logger.shows_warnings());
    }

    #[test]
    fn loggers_are_independent() {
        let quiet = PackagingLogger::new(None);
        let loud = PackagingLogger::new(Some(LogLevel::Debug));
        assert!(!quiet.shows_warnings());
        assert!(loud.shows_warnings());
    }

    #[test]
    fn render_indents_pretty_json() {
        let rendered = render(&serde_json::json!({ "appDir": "C:\\app" }));
        assert!(rendered.starts_with("  {"));
        assert!(rendered.contains("\"appDir\""));
    }
}
