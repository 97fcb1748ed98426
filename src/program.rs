//! Resolution of caller options into one [`ProgramOptions`].
//!
//! This is where the identity source, the located toolchain and the signing
//! inputs meet. The result is everything the execution stage needs: it never
//! looks at [`PackagingOptions`] again.

use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::logger::PackagingLogger;
use crate::manifest::{ManifestVariables, manifest_content};
use crate::settings::{LogLevel, PackagingOptions, non_empty};
use crate::toolchain::ToolchainLocator;
use crate::utils::fs::{empty_dir, ensure_dir, exists};
use crate::utils::remove_file_extension;
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Layout directory inside the output directory.
pub const LAYOUT_DIR: &str = "msix_layout";

const PASSWORD_LENGTH: usize = 16;
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}<>?";

/// Fully resolved configuration of one packaging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOptions {
    /// `makeappx.exe`
    pub make_msix: PathBuf,
    /// `makepri.exe`
    pub make_pri: PathBuf,
    /// `SignTool.exe`
    pub sign_tool: PathBuf,
    /// Output directory, emptied before the run
    pub output_dir: PathBuf,
    /// Directory packed into the `.msix`
    pub layout_dir: PathBuf,
    /// Final package path
    pub msix: PathBuf,
    /// App directory, `None` for sparse packages
    pub app_dir: Option<PathBuf>,
    /// `app/` inside the layout
    pub app_layout: PathBuf,
    /// Manifest document written into the layout
    #[serde(skip_serializing)]
    pub manifest_content: String,
    /// `AppxManifest.xml` inside the layout
    pub app_manifest_layout: PathBuf,
    /// `None` means the built-in default assets
    pub assets_in: Option<PathBuf>,
    /// `assets/` inside the layout
    pub assets_layout: PathBuf,
    /// Certificate used for signing, generated or supplied
    pub cert_pfx: Option<PathBuf>,
    /// Public half of a generated certificate
    pub cert_cer: Option<PathBuf>,
    /// Password of `cert_pfx`
    #[serde(skip_serializing)]
    pub cert_pass: String,
    /// `priconfig.xml`
    pub pri_config: PathBuf,
    /// `resources.pri`
    pub pri_file: PathBuf,
    /// Whether the PRI steps run
    pub create_pri: bool,
    /// Manifest allows external content
    pub is_sparse_package: bool,
    /// Arguments after `signtool sign`
    #[serde(skip_serializing)]
    pub sign_params: Vec<String>,
    /// Whether the package is signed
    pub sign: bool,
    /// Whether a dev certificate is generated first
    pub create_dev_cert: bool,
    /// Publisher as given: verbatim from a manifest (`CN=...`), or the
    /// `publisher` variable, which may omit the prefix
    pub publisher: String,
}

/// Output and layout directories, freshly prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folders {
    /// Output directory, emptied before the run
    pub output_dir: PathBuf,
    /// Directory packed into the `.msix`
    pub layout_dir: PathBuf,
}

/// Empties (or creates) the output directory and creates the layout directory.
pub async fn ensure_folders(output_dir: &Path, logger: &PackagingLogger) -> Result<Folders> {
    let layout_dir = output_dir.join(LAYOUT_DIR);

    if exists(output_dir).await {
        logger.debug_with(
            "Output dir already exists. Making sure its empty.",
            &serde_json::json!({ "outputDir": output_dir }),
        );
        empty_dir(output_dir).await?;
    } else {
        logger.debug("Output dir does not exists. Creating it.");
        ensure_dir(output_dir).await?;
    }

    logger.debug_with("Creating layout dir", &serde_json::json!({ "layoutDir": layout_dir }));
    ensure_dir(&layout_dir).await?;

    Ok(Folders {
        output_dir: output_dir.to_path_buf(),
        layout_dir,
    })
}

/// Random password for a generated certificate.
///
/// The alphabet has no `'` so the value can be embedded in a single-quoted
/// PowerShell string unchanged.
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_ALPHABET[rng.random_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Name the package is called after when none is given.
fn app_name(options: &PackagingOptions, manifest_vars: Option<&ManifestVariables>) -> String {
    manifest_vars
        .and_then(|vars| vars.manifest_app_name.clone())
        .or_else(|| {
            options
                .manifest_variables()
                .and_then(|vars| non_empty(&vars.app_executable))
                .map(|exe| remove_file_extension(exe).to_string())
        })
        .unwrap_or_else(|| "app".to_string())
}

fn package_arch(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
) -> Option<String> {
    manifest_vars
        .and_then(|vars| vars.manifest_package_arch.clone())
        .or_else(|| {
            options
                .manifest_variables()
                .and_then(|vars| non_empty(&vars.target_arch))
                .map(str::to_string)
        })
}

fn publisher(options: &PackagingOptions, manifest_vars: Option<&ManifestVariables>) -> String {
    manifest_vars
        .and_then(|vars| vars.manifest_publisher.clone())
        .or_else(|| {
            options
                .manifest_variables()
                .and_then(|vars| non_empty(&vars.publisher))
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// File name of the package: `packageName`, `{app}_{arch}.msix` or `{app}.msix`.
pub fn package_file_name(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
) -> String {
    if let Some(name) = non_empty(&options.package_name) {
        return name.to_string();
    }
    let app = app_name(options, manifest_vars);
    match package_arch(options, manifest_vars) {
        Some(arch) => format!("{app}_{arch}.msix"),
        None => format!("{app}.msix"),
    }
}

/// Certificate material and SignTool arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Signing {
    sign: bool,
    create_dev_cert: bool,
    cert_pfx: Option<PathBuf>,
    cert_cer: Option<PathBuf>,
    cert_pass: String,
    sign_params: Vec<String>,
}

fn resolve_signing(options: &PackagingOptions, output_dir: &Path) -> Signing {
    if !options.sign_enabled() {
        return Signing {
            sign: false,
            create_dev_cert: false,
            cert_pfx: None,
            cert_cer: None,
            cert_pass: options.cert_pass().unwrap_or_default().to_string(),
            sign_params: Vec::new(),
        };
    }

    let (cert_pfx, cert_cer, create_dev_cert, cert_pass) = match &options.cert {
        Some(cert) => (
            cert.clone(),
            None,
            false,
            options.cert_pass().unwrap_or_default().to_string(),
        ),
        None => (
            output_dir.join("dev_cert.pfx"),
            Some(output_dir.join("dev_cert.cer")),
            true,
            options
                .cert_pass()
                .map_or_else(generate_password, str::to_string),
        ),
    };

    let sign_params = match options.custom_sign_params() {
        Some(params) => params.to_vec(),
        None => {
            let mut params = vec![
                "-fd".to_string(),
                "sha256".to_string(),
                "-f".to_string(),
                cert_pfx.to_string_lossy().into_owned(),
            ];
            if !cert_pass.is_empty() {
                params.push("-p".to_string());
                params.push(cert_pass.clone());
            }
            if options.log_level == Some(LogLevel::Debug) {
                params.push("-debug".to_string());
            }
            params
        }
    };

    Signing {
        sign: true,
        create_dev_cert,
        cert_pfx: Some(cert_pfx),
        cert_cer,
        cert_pass,
        sign_params,
    }
}

/// Builds the [`ProgramOptions`] for validated `options`.
///
/// Locates the toolchain, prepares the output directory, and resolves the
/// manifest and the signing material, in that order. Any failure is fatal.
pub async fn make_program_options(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
    locator: &ToolchainLocator,
    logger: &PackagingLogger,
) -> Result<ProgramOptions> {
    let toolchain = locator.locate(options, manifest_vars, logger).await?;
    let Folders {
        output_dir,
        layout_dir,
    } = ensure_folders(&options.output_dir, logger).await?;

    let msix = output_dir.join(package_file_name(options, manifest_vars));
    let signing = resolve_signing(options, &output_dir);

    let manifest_content = manifest_content(options).await?.ok_or_else(|| {
        Diagnostic::fatal(
            "no_identity_source",
            "Neither app manifest <appManifest> nor manifest variables <manifestVariables> provided.",
        )
    })?;

    let program = ProgramOptions {
        make_msix: toolchain.make_appx,
        make_pri: toolchain.make_pri,
        sign_tool: toolchain.sign_tool,
        msix,
        app_dir: options.app_dir.clone(),
        app_layout: layout_dir.join("app"),
        manifest_content,
        app_manifest_layout: layout_dir.join("AppxManifest.xml"),
        assets_in: options.package_assets.clone(),
        assets_layout: layout_dir.join("assets"),
        cert_pfx: signing.cert_pfx,
        cert_cer: signing.cert_cer,
        cert_pass: signing.cert_pass,
        pri_config: layout_dir.join("priconfig.xml"),
        pri_file: layout_dir.join("resources.pri"),
        create_pri: options.create_pri(),
        is_sparse_package: manifest_vars.is_some_and(|vars| vars.manifest_is_sparse_package),
        sign_params: signing.sign_params,
        sign: signing.sign,
        create_dev_cert: signing.create_dev_cert,
        publisher: publisher(options, manifest_vars),
        output_dir,
        layout_dir,
    };

    logger.debug_with("Program options", &program);
    Ok(program)
}
