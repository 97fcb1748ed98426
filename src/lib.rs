//! # MSIX Packager
//!
//! Packages a Windows application directory, typically an Electron app,
//! into a signed `.msix` using the Windows SDK tooling.
//!
//! The pipeline validates the caller's [`PackagingOptions`], locates
//! `makeappx`/`makepri`/`signtool` in an installed Windows Kit, builds a
//! package layout around either an existing `AppxManifest.xml` or one
//! synthesized from [`ManifestGenerationVariables`], then packs and signs it.
//! A self-signed development certificate is created when no certificate is
//! supplied.
//!
//! ## Usage
//!
//! ```bash
//! msix_packager --app-manifest AppxManifest.xml --app-dir out/app --output-dir dist
//! msix_packager --config msix.toml --log-level debug
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod diagnostic;
pub mod error;
pub mod logger;
pub mod manifest;
pub mod msix;
pub mod program;
pub mod settings;
pub mod toolchain;
pub mod utils;
pub mod validator;
pub mod version;

pub use diagnostic::{Diagnostic, Severity, ValidationReport};
pub use error::{PackagingError, Result};
pub use logger::PackagingLogger;
pub use manifest::{ManifestVariables, manifest_content, read_manifest_variables};
pub use msix::{ProcessRunner, ToolRunner};
pub use program::{ProgramOptions, make_program_options};
pub use settings::{
    IdentitySource, LogLevel, ManifestGenerationVariables, PackagingConfig, PackagingOptions,
    PackagingOptionsBuilder,
};
pub use toolchain::{Toolchain, ToolchainLocator, locate_msix_tooling};
pub use validator::verify_options;
pub use version::{WindowsVersion, ensure_windows_version, is_valid_version};

use crate::error::ErrorExt;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Files produced by a successful packaging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifacts {
    /// The packed (and, unless disabled, signed) `.msix`
    pub msix_package: PathBuf,
    /// Certificate the package was signed with, if it was signed
    pub certificate: Option<PathBuf>,
    /// Package size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the package
    pub checksum: String,
}

/// Runs the full packaging pipeline for `options`.
///
/// External tools are spawned as real processes and the toolchain is
/// searched under the standard Windows Kits install directory.
pub async fn package_msix(options: PackagingOptions) -> Result<Artifacts> {
    let logger = PackagingLogger::new(options.log_level);
    let runner = ProcessRunner::new(logger);
    package_msix_with(options, &runner, &ToolchainLocator::new()).await
}

/// Runs the full packaging pipeline with an explicit tool runner and locator.
pub async fn package_msix_with<R: ToolRunner>(
    options: PackagingOptions,
    runner: &R,
    locator: &ToolchainLocator,
) -> Result<Artifacts> {
    let logger = PackagingLogger::new(options.log_level);

    let manifest_vars = read_manifest_variables(&options).await?;
    verify_options(&options, manifest_vars.as_ref(), runner, &logger).await?;

    let program = make_program_options(&options, manifest_vars.as_ref(), locator, &logger).await?;
    logger.debug_with("Resolved program options", &program);

    msix::create_layout(&program, &logger).await?;
    msix::ensure_dev_cert(runner, &program, &logger).await?;
    msix::pri_config(runner, &program, &logger).await?;
    msix::pri(runner, &program, &logger).await?;
    msix::make(runner, &program).await?;
    msix::sign(runner, &program, &logger).await?;

    let size = tokio::fs::metadata(&program.msix)
        .await
        .fs_context("reading package metadata", &program.msix)?
        .len();
    let checksum = calculate_sha256(&program.msix).await?;

    let artifacts = Artifacts {
        msix_package: program.msix.clone(),
        certificate: if program.sign {
            program.cert_pfx.clone()
        } else {
            None
        },
        size,
        checksum,
    };
    logger.info(&format!("Package created: {}", artifacts.msix_package.display()));
    Ok(artifacts)
}

/// Hex-encoded SHA-256 of a file, read in 8KB chunks.
async fn calculate_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening package", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading package", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
