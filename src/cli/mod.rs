//! Command line interface for msix_packager.
//!
//! Parses the arguments, merges them over an optional config file, installs
//! the logger and runs the packaging pipeline.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::error::Result;
use crate::settings::LogLevel;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let output = OutputManager::new();

    if let Err(message) = validate_args(&args) {
        output.error(&message);
        return Ok(1);
    }

    let options = args.into_options().await?;
    init_logging(options.log_level);

    let _ = output.info(&format!(
        "Packaging into {}",
        options.output_dir.display()
    ));
    let artifacts = crate::package_msix(options).await?;

    let _ = output.success(&format!(
        "Created {}",
        artifacts.msix_package.display()
    ));
    let _ = output.indent(&format!("size: {} bytes", artifacts.size));
    let _ = output.indent(&format!("sha256: {}", artifacts.checksum));
    if let Some(cert) = &artifacts.certificate {
        let _ = output.indent(&format!("signed with: {}", cert.display()));
    }
    Ok(0)
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}

/// Default `env_logger` filter for a log level; `RUST_LOG` takes precedence.
pub fn default_filter(level: Option<LogLevel>) -> &'static str {
    match level {
        Some(LogLevel::Debug) => "msix_packager=debug",
        Some(LogLevel::Warn) | None => "msix_packager=info",
    }
}

fn init_logging(level: Option<LogLevel>) {
    let env = env_logger::Env::default().default_filter_or(default_filter(level));
    // A second installation (tests, embedding) is not an error.
    let _ = env_logger::Builder::from_env(env).try_init();
}
