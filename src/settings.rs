//! Caller-facing packaging configuration.
//!
//! [`PackagingOptions`] is what a caller hands to the pipeline. The package
//! identity comes from exactly one place: an existing `AppxManifest.xml`, or a
//! set of [`ManifestGenerationVariables`] a manifest is generated from. That
//! choice is modelled by [`IdentitySource`], so the two cannot be mixed.
//!
//! Options can be built in code with [`PackagingOptionsBuilder`] or loaded
//! from a TOML/JSON file through [`PackagingConfig`], whose keys mirror the
//! option names used by the Electron tooling (`appManifest`, `cert_pass`, ...).
//!
//! # Examples
//!
//! ```no_run
//! use msix_packager::settings::{ManifestGenerationVariables, PackagingOptionsBuilder};
//!
//! # fn example() -> msix_packager::Result<()> {
//! let options = PackagingOptionsBuilder::new()
//!     .output_dir("C:\\out")
//!     .app_dir("C:\\app")
//!     .manifest_variables(ManifestGenerationVariables {
//!         publisher: Some("CN=Electron".into()),
//!         package_identity: Some("com.electron.app".into()),
//!         package_version: Some("1.0.0".into()),
//!         app_executable: Some("app.exe".into()),
//!         target_arch: Some("x64".into()),
//!         ..Default::default()
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Context, ErrorExt, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Verbosity of a packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show warnings in addition to errors.
    Warn,
    /// Show everything, and make SignTool verbose.
    Debug,
}

/// Values a manifest is generated from when no `AppxManifest.xml` is given.
///
/// `package_identity`, `publisher`, `package_version`, `app_executable` and
/// `target_arch` are required; they are optional here so that a missing value
/// is reported by validation with its documented message instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestGenerationVariables {
    /// `Identity/@Name`
    pub package_identity: Option<String>,
    /// `Identity/@Publisher`, with or without a `CN=` prefix
    pub publisher: Option<String>,
    /// Falls back to the publisher
    pub publisher_display_name: Option<String>,
    /// Semantic or 4-part version
    pub package_version: Option<String>,
    /// Falls back to the app display name, then the executable name
    pub package_display_name: Option<String>,
    /// Falls back to the package display name, app display name, executable name
    pub package_description: Option<String>,
    /// Falls back to `transparent`
    pub package_background_color: Option<String>,
    /// Executable inside the app directory, e.g. `HelloMSIX.exe`
    pub app_executable: Option<String>,
    /// Falls back to the package display name, then the executable name
    pub app_display_name: Option<String>,
    /// `x64`, `arm64`, `x86`, `arm` or `*`
    pub target_arch: Option<String>,
    /// Falls back to `10.0.14393.0`
    #[serde(rename = "packageMinOSVersion")]
    pub package_min_os_version: Option<String>,
    /// Falls back to the min OS version, then `10.0.14393.0`
    #[serde(rename = "packageMaxOSVersionTested")]
    pub package_max_os_version_tested: Option<String>,
}

/// Where the package identity comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentitySource {
    /// An existing `AppxManifest.xml`, copied into the package as-is.
    AppManifest(PathBuf),
    /// Variables a manifest is generated from.
    Variables(ManifestGenerationVariables),
}

/// Options for one packaging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingOptions {
    /// Identity source; `None` fails validation.
    pub identity: Option<IdentitySource>,
    /// Packaged app directory. Not needed for sparse packages.
    pub app_dir: Option<PathBuf>,
    /// Icons and tile images. Built-in defaults are used when absent.
    pub package_assets: Option<PathBuf>,
    /// Where the package (and the dev cert) is written. Emptied first.
    pub output_dir: PathBuf,
    /// File name of the package, derived from the manifest when absent.
    pub package_name: Option<String>,
    /// Windows Kit version, e.g. `10.0.22621.0`.
    pub windows_kit_version: Option<String>,
    /// Full path to a Windows Kit bin directory; beats the version.
    pub windows_kit_path: Option<PathBuf>,
    /// Generate `resources.pri`. Defaults to `true`.
    pub create_pri: Option<bool>,
    /// Signing certificate (`.pfx`).
    pub cert: Option<PathBuf>,
    /// Certificate password.
    #[serde(skip_serializing)]
    pub cert_pass: Option<String>,
    /// SignTool arguments that replace the generated ones.
    pub sign_params: Option<Vec<String>>,
    /// Sign the package. Defaults to `true`.
    pub sign: Option<bool>,
    /// Verbosity.
    pub log_level: Option<LogLevel>,
}

impl PackagingOptions {
    /// Path of the existing manifest, when that is the identity source.
    pub fn app_manifest(&self) -> Option<&Path> {
        match &self.identity {
            Some(IdentitySource::AppManifest(path)) => Some(path),
            _ => None,
        }
    }

    /// Generation variables, when they are the identity source.
    pub fn manifest_variables(&self) -> Option<&ManifestGenerationVariables> {
        match &self.identity {
            Some(IdentitySource::Variables(vars)) => Some(vars),
            _ => None,
        }
    }

    /// Whether PRI resources are generated.
    pub fn create_pri(&self) -> bool {
        self.create_pri.unwrap_or(true)
    }

    /// Whether signing was left enabled.
    pub fn sign_enabled(&self) -> bool {
        self.sign != Some(false)
    }

    /// Custom SignTool arguments, if a non-empty list was given.
    pub fn custom_sign_params(&self) -> Option<&[String]> {
        self.sign_params.as_deref().filter(|p| !p.is_empty())
    }

    /// Certificate password, if a non-empty one was given.
    pub fn cert_pass(&self) -> Option<&str> {
        non_empty(&self.cert_pass)
    }
}

/// Treats `None` and `""` alike, as the Electron tooling does.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Builder for [`PackagingOptions`].
#[derive(Debug, Default)]
pub struct PackagingOptionsBuilder {
    identity: Option<IdentitySource>,
    app_dir: Option<PathBuf>,
    package_assets: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    package_name: Option<String>,
    windows_kit_version: Option<String>,
    windows_kit_path: Option<PathBuf>,
    create_pri: Option<bool>,
    cert: Option<PathBuf>,
    cert_pass: Option<String>,
    sign_params: Option<Vec<String>>,
    sign: Option<bool>,
    log_level: Option<LogLevel>,
}

impl PackagingOptionsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Uses an existing manifest as the identity source.
    pub fn app_manifest<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.identity = Some(IdentitySource::AppManifest(path.as_ref().to_path_buf()));
        self
    }

    /// Generates the manifest from variables.
    pub fn manifest_variables(mut self, vars: ManifestGenerationVariables) -> Self {
        self.identity = Some(IdentitySource::Variables(vars));
        self
    }

    /// Sets the app directory.
    pub fn app_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the assets directory.
    pub fn package_assets<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.package_assets = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the package file name.
    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    /// Pins the Windows Kit version.
    pub fn windows_kit_version(mut self, version: impl Into<String>) -> Self {
        self.windows_kit_version = Some(version.into());
        self
    }

    /// Pins the Windows Kit directory.
    pub fn windows_kit_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.windows_kit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables or disables PRI generation.
    pub fn create_pri(mut self, create: bool) -> Self {
        self.create_pri = Some(create);
        self
    }

    /// Sets the signing certificate.
    pub fn cert<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cert = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the certificate password.
    pub fn cert_pass(mut self, password: impl Into<String>) -> Self {
        self.cert_pass = Some(password.into());
        self
    }

    /// Replaces the generated SignTool arguments.
    pub fn sign_params(mut self, params: Vec<String>) -> Self {
        self.sign_params = Some(params);
        self
    }

    /// Enables or disables signing.
    pub fn sign(mut self, sign: bool) -> Self {
        self.sign = Some(sign);
        self
    }

    /// Sets the verbosity.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// Returns an error if `output_dir` is missing.
    pub fn build(self) -> Result<PackagingOptions> {
        Ok(PackagingOptions {
            identity: self.identity,
            app_dir: self.app_dir,
            package_assets: self.package_assets,
            output_dir: self.output_dir.context("output_dir is required")?,
            package_name: self.package_name,
            windows_kit_version: self.windows_kit_version,
            windows_kit_path: self.windows_kit_path,
            create_pri: self.create_pri,
            cert: self.cert,
            cert_pass: self.cert_pass,
            sign_params: self.sign_params,
            sign: self.sign,
            log_level: self.log_level,
        })
    }
}

/// On-disk form of [`PackagingOptions`].
///
/// ```toml
/// appDir = "C:\\app"
/// outputDir = "C:\\out"
///
/// [manifestVariables]
/// publisher = "CN=Electron"
/// packageIdentity = "com.electron.app"
/// packageVersion = "1.0.0"
/// appExecutable = "app.exe"
/// targetArch = "x64"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackagingConfig {
    /// Existing manifest; wins over `manifest_variables`
    pub app_manifest: Option<PathBuf>,
    /// Values to generate the manifest from
    pub manifest_variables: Option<ManifestGenerationVariables>,
    /// App directory
    pub app_dir: Option<PathBuf>,
    /// Assets directory
    pub package_assets: Option<PathBuf>,
    /// Output directory
    pub output_dir: Option<PathBuf>,
    /// Package file name
    pub package_name: Option<String>,
    /// Windows Kit version
    pub windows_kit_version: Option<String>,
    /// Windows Kit binary directory
    pub windows_kit_path: Option<PathBuf>,
    /// Generate `resources.pri`
    pub create_pri: Option<bool>,
    /// Signing certificate
    pub cert: Option<PathBuf>,
    /// Certificate password
    #[serde(rename = "cert_pass")]
    pub cert_pass: Option<String>,
    /// SignTool arguments
    pub sign_params: Option<Vec<String>>,
    /// Sign the package
    pub sign: Option<bool>,
    /// Verbosity
    pub log_level: Option<LogLevel>,
}

impl PackagingConfig {
    /// Reads a config file; `.json` files are parsed as JSON, anything else as TOML.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading config file", path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Converts into options. A manifest path wins over variables.
    pub fn into_builder(self) -> PackagingOptionsBuilder {
        let identity = match (self.app_manifest, self.manifest_variables) {
            (Some(path), _) => Some(IdentitySource::AppManifest(path)),
            (None, Some(vars)) => Some(IdentitySource::Variables(vars)),
            (None, None) => None,
        };
        PackagingOptionsBuilder {
            identity,
            app_dir: self.app_dir,
            package_assets: self.package_assets,
            output_dir: self.output_dir,
            package_name: self.package_name,
            windows_kit_version: self.windows_kit_version,
            windows_kit_path: self.windows_kit_path,
            create_pri: self.create_pri,
            cert: self.cert,
            cert_pass: self.cert_pass,
            sign_params: self.sign_params,
            sign: self.sign,
            log_level: self.log_level,
        }
    }
}
