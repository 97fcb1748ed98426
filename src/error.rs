//! Error types for MSIX packaging.
//!
//! Provides contextual error chaining, filesystem errors that carry the path
//! being touched, and the fatal validation variant whose message is the exact
//! text a caller (or test) matches on.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//!
//! # Example
//!
//! ```no_run
//! use msix_packager::error::{ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_manifest(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).fs_context("reading app manifest", path)
//! }
//! ```

use crate::diagnostic::Diagnostic;
use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the packaging pipeline.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum PackagingError {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// A fatal validation or resolution failure.
    ///
    /// Displays exactly the diagnostic message; the structured context (paths,
    /// offending values) is available through [`PackagingError::context`].
    #[error("{}", .0.message)]
    Validation(Diagnostic),

    /// File system error with path context.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "reading app manifest")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// An external tool could not be spawned at all.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// An external tool ran and exited unsuccessfully.
    #[error("Failed running {program} Exit Code: {code} See previous errors for details")]
    ToolFailed {
        /// Program that was run
        program: String,
        /// Exit code, `-1` when the process was terminated by a signal
        code: i32,
    },

    /// A string that should hold exactly four numeric parts did not.
    #[error("Invalid Windows version string. {{{0}}}")]
    InvalidWindowsVersion(String),

    /// A package version that is neither semantic nor a Windows version.
    #[error("Invalid semantic version string. {{{0}}}")]
    InvalidSemanticVersion(String),

    /// The app manifest is not well-formed XML.
    #[error("failed to parse app manifest {path}: {error}")]
    ManifestParse {
        /// Manifest that was read
        path: PathBuf,
        /// Parser error
        error: roxmltree::Error,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Image encoding error (default assets).
    #[error("{0}")]
    ImageError(#[from] image::ImageError),

    /// Error walking directory (layout copies).
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// Handlebars template rendering error.
    #[error("{0}")]
    HandleBarsError(#[from] handlebars::RenderError),

    /// Handlebars template parsing error.
    #[error("{0}")]
    Template(#[from] handlebars::TemplateError),

    /// JSON config parsing error.
    #[error("{0}")]
    JsonError(#[from] serde_json::error::Error),

    /// TOML config parsing error.
    #[error("{0}")]
    TomlError(#[from] toml::de::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

impl PackagingError {
    /// Builds a fatal validation error from a message and optional context.
    pub fn fatal(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(Diagnostic::fatal(code, message))
    }

    /// Returns the diagnostic behind a validation error.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Validation(diagnostic) => Some(diagnostic),
            Self::Context(_, inner) => inner.diagnostic(),
            _ => None,
        }
    }

    /// Structured context attached to a validation error, if any.
    pub fn context(&self) -> Option<&serde_json::Value> {
        self.diagnostic().and_then(|d| d.context.as_ref())
    }
}

impl From<Diagnostic> for PackagingError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::Validation(diagnostic)
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, PackagingError>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with [`PackagingError`].
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| PackagingError::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| PackagingError::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| PackagingError::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| PackagingError::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying assets".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| PackagingError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}
