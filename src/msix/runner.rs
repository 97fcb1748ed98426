//! External process execution.
//!
//! Every SDK binary, `certutil` and PowerShell is started through the
//! [`ToolRunner`] trait so that the pipeline can be exercised without the
//! Windows SDK installed.

use crate::error::{PackagingError, Result};
use crate::logger::PackagingLogger;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs an external program to completion.
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Runs `program` with `args` and returns its cleaned stdout lines.
    ///
    /// A non-zero exit fails with [`PackagingError::ToolFailed`].
    async fn run(&self, program: &Path, args: &[String]) -> Result<Vec<String>>;
}

/// [`ToolRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    logger: PackagingLogger,
}

impl ProcessRunner {
    /// Creates a runner that reports through `logger`.
    pub fn new(logger: PackagingLogger) -> Self {
        Self { logger }
    }
}

impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<Vec<String>> {
        let name = program.display().to_string();
        self.logger
            .debug_with(&format!("Calling {name} with args"), args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|error| PackagingError::CommandFailed {
                command: name.clone(),
                error,
            })?;

        let stdout = clean_output(&output.stdout);
        let stderr = clean_output(&output.stderr);
        self.logger.debug_with(&format!("stdout of {name}"), &stdout);

        if !output.status.success() {
            self.logger.error_with(&format!("stderr of {name}"), &stderr);
            return Err(PackagingError::ToolFailed {
                program: name,
                code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(stdout)
    }
}

/// Splits tool output into lines, dropping carriage returns and collapsing
/// doubled backslashes.
pub fn clean_output(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .replace('\r', "")
        .replace(r"\\", r"\")
        .split('\n')
        .map(str::to_string)
        .collect()
}
