//! Command line argument parsing and validation.
//!
//! Every flag mirrors a packaging option. When `--config` is given the file
//! is loaded first and flags override its values.

use crate::error::Result;
use crate::settings::{LogLevel, PackagingConfig, PackagingOptions, PackagingOptionsBuilder};
use clap::Parser;
use std::path::PathBuf;

/// Package a Windows application into a signed MSIX
#[derive(Parser, Debug)]
#[command(
    name = "msix_packager",
    version,
    about = "Package a Windows application into a signed MSIX",
    long_about = "Package an Electron (or any Windows) application directory into an MSIX
using the Windows SDK tooling (makeappx, makepri, signtool).

Usage:
  msix_packager --app-manifest AppxManifest.xml --app-dir out/app --output-dir dist
  msix_packager --config msix.toml
  msix_packager --config msix.json --no-sign --log-level debug"
)]
pub struct Args {
    /// TOML or JSON file holding the packaging options
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Existing AppxManifest.xml to package
    #[arg(long, value_name = "PATH")]
    pub app_manifest: Option<PathBuf>,

    /// Application directory copied into the package
    #[arg(long, value_name = "DIR")]
    pub app_dir: Option<PathBuf>,

    /// Directory with the package logos
    #[arg(long, value_name = "DIR")]
    pub package_assets: Option<PathBuf>,

    /// Where the layout and the .msix are written
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name of the .msix
    #[arg(long, value_name = "NAME")]
    pub package_name: Option<String>,

    /// Windows Kit version to take the tools from
    #[arg(long, value_name = "VERSION")]
    pub windows_kit_version: Option<String>,

    /// Directory holding makeappx, makepri and signtool
    #[arg(long, value_name = "DIR")]
    pub windows_kit_path: Option<PathBuf>,

    /// Do not generate resources.pri
    #[arg(long)]
    pub no_pri: bool,

    /// Certificate (.pfx) to sign with
    #[arg(long, value_name = "PFX")]
    pub cert: Option<PathBuf>,

    /// Password of the certificate
    #[arg(long, value_name = "PASS", env = "MSIX_CERT_PASS", hide_env_values = true)]
    pub cert_pass: Option<String>,

    /// Argument passed to `signtool sign`, replacing the generated ones
    #[arg(long = "sign-param", value_name = "ARG", allow_hyphen_values = true)]
    pub sign_params: Vec<String>,

    /// Leave the package unsigned
    #[arg(long)]
    pub no_sign: bool,

    /// Verbosity
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.no_sign && !self.sign_params.is_empty() {
            return Err("--sign-param cannot be combined with --no-sign".to_string());
        }
        if self.package_name.as_deref().is_some_and(str::is_empty) {
            return Err("--package-name must not be empty".to_string());
        }
        Ok(())
    }

    /// Resolves the packaging options: the config file if any, then the flags.
    pub async fn into_options(self) -> Result<PackagingOptions> {
        let builder = match &self.config {
            Some(path) => PackagingConfig::from_file(path).await?.into_builder(),
            None => PackagingOptionsBuilder::new(),
        };
        self.apply(builder).build()
    }

    fn apply(self, mut builder: PackagingOptionsBuilder) -> PackagingOptionsBuilder {
        if let Some(path) = self.app_manifest {
            builder = builder.app_manifest(path);
        }
        if let Some(dir) = self.app_dir {
            builder = builder.app_dir(dir);
        }
        if let Some(dir) = self.package_assets {
            builder = builder.package_assets(dir);
        }
        if let Some(dir) = self.output_dir {
            builder = builder.output_dir(dir);
        }
        if let Some(name) = self.package_name {
            builder = builder.package_name(name);
        }
        if let Some(version) = self.windows_kit_version {
            builder = builder.windows_kit_version(version);
        }
        if let Some(dir) = self.windows_kit_path {
            builder = builder.windows_kit_path(dir);
        }
        if self.no_pri {
            builder = builder.create_pri(false);
        }
        if let Some(cert) = self.cert {
            builder = builder.cert(cert);
        }
        if let Some(pass) = self.cert_pass {
            builder = builder.cert_pass(pass);
        }
        if !self.sign_params.is_empty() {
            builder = builder.sign_params(self.sign_params);
        }
        if self.no_sign {
            builder = builder.sign(false);
        }
        if let Some(level) = self.log_level {
            builder = builder.log_level(level);
        }
        builder
    }
}
