//! Windows Kit discovery.
//!
//! The SDK binaries live in `<kit root>\<version>\<arch>`. The directory is
//! picked from the first source that says anything about it:
//!
//! 1. an explicit `windowsKitPath`
//! 2. an explicit `windowsKitVersion`
//! 3. the minimum OS version of the manifest (or of the generation variables)
//! 4. [`DEFAULT_WINDOWS_KIT_VERSION`]
//!
//! A source that is present but points nowhere is fatal; the search never
//! falls through to the next tier. Kits older than
//! [`MIN_ARM_WINDOWS_KIT_VERSION`] ship no arm64 `makeappx.exe`, so arm64
//! hosts use the x64 binaries of such kits.

use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::logger::PackagingLogger;
use crate::manifest::ManifestVariables;
use crate::settings::{IdentitySource, PackagingOptions, non_empty};
use crate::utils::fs::exists;
use crate::version::WindowsVersion;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Standard install location of the Windows 10/11 SDK binaries.
pub const WINDOWS_KIT_BIN_PATH: &str = r"C:\Program Files (x86)\Windows Kits\10\bin";

/// First kit version that ships arm64 binaries.
pub const MIN_ARM_WINDOWS_KIT_VERSION: &str = "10.0.22621.0";

/// Kit version used when nothing else names one.
pub const DEFAULT_WINDOWS_KIT_VERSION: &str = "10.0.26100.0";

const MAKE_APPX_EXE: &str = "makeappx.exe";
const MAKE_PRI_EXE: &str = "makepri.exe";
const SIGN_TOOL_EXE: &str = "SignTool.exe";
const MAKE_CERT_EXE: &str = "makecert.exe";

/// Absolute paths of the SDK binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toolchain {
    /// `makeappx.exe`
    pub make_appx: PathBuf,
    /// `makepri.exe`
    pub make_pri: PathBuf,
    /// `SignTool.exe`
    pub sign_tool: PathBuf,
    /// `makecert.exe`
    pub make_cert: PathBuf,
}

impl Toolchain {
    /// Binary paths inside `dir`, without checking that they exist.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            make_appx: dir.join(MAKE_APPX_EXE),
            make_pri: dir.join(MAKE_PRI_EXE),
            sign_tool: dir.join(SIGN_TOOL_EXE),
            make_cert: dir.join(MAKE_CERT_EXE),
        }
    }
}

/// Architecture name of the running process as used by the Windows Kit
/// directory layout.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm",
        other => other,
    }
}

/// Finds the Windows Kit binaries.
#[derive(Debug, Clone)]
pub struct ToolchainLocator {
    kit_root: PathBuf,
    arch: String,
}

impl Default for ToolchainLocator {
    fn default() -> Self {
        Self {
            kit_root: PathBuf::from(WINDOWS_KIT_BIN_PATH),
            arch: host_arch().to_string(),
        }
    }
}

impl ToolchainLocator {
    /// Locator for the standard kit root and the host architecture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches versioned kits under `root` instead of the standard location.
    pub fn with_kit_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.kit_root = root.as_ref().to_path_buf();
        self
    }

    /// Pretends to run on `arch` (`x64`, `x86`, `arm64`, ...).
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// Kit directory for `version`, with the arm64 substitution applied.
    pub fn kit_dir(&self, version: &str) -> Result<PathBuf> {
        let arch = if WindowsVersion::is_older(version, MIN_ARM_WINDOWS_KIT_VERSION)?
            && self.arch == "arm64"
        {
            "x64"
        } else {
            self.arch.as_str()
        };
        Ok(self.kit_root.join(version).join(arch))
    }

    /// Resolves the binaries for `options`.
    pub async fn locate(
        &self,
        options: &PackagingOptions,
        manifest_vars: Option<&ManifestVariables>,
        logger: &PackagingLogger,
    ) -> Result<Toolchain> {
        if let Some(kit_path) = &options.windows_kit_path {
            logger.debug_with(
                "WindowsKitPath was provided and takes priority over WindowsKitVersion. Checking if it exists....",
                &json!({ "windowsKitPath": kit_path }),
            );
            if !exists(kit_path).await {
                return Err(Diagnostic::fatal(
                    "windows_kit_path_missing",
                    "The WindowsKitPath was provided but does not exist.",
                )
                .with_context(json!({ "windowsKitPath": kit_path }))
                .into());
            }
            let toolchain = binaries(kit_path).await?;
            logger.debug_with("WindowsKitPath exists. Getting binary paths.", &toolchain);
            return Ok(toolchain);
        }
        logger.debug("No WindowsKitPath provided. Will try WindowsKitVersion next.");

        if let Some(version) = non_empty(&options.windows_kit_version) {
            logger.debug_with(
                "WindowsKitVersion was provided and takes priority over AppxManifest. Checking if it exists....",
                &json!({ "windowsKitVersion": version }),
            );
            let dir = self.kit_dir(version)?;
            if !exists(&dir).await {
                return Err(Diagnostic::fatal(
                    "windows_kit_version_missing",
                    "WindowsKitVersion was provided but does not exist.",
                )
                .with_context(json!({ "windowsKitPath": dir }))
                .into());
            }
            let toolchain = binaries(&dir).await?;
            logger.debug_with(
                &format!("WindowsKit version {version} exists. Getting binary paths."),
                &toolchain,
            );
            return Ok(toolchain);
        }
        logger.debug("No WindowsKitVersion provided. Will try AppxManifest.xml min OS version next.");

        let derived_version = match &options.identity {
            Some(IdentitySource::AppManifest(_)) => {
                let version = manifest_vars.and_then(|vars| vars.manifest_os_min_version.as_deref());
                match version {
                    Some(version) => Some(version),
                    None => {
                        return Err(Diagnostic::fatal(
                            "windows_kit_version_unknown",
                            "Couldn't find Windows Kit version in AppManifest.",
                        )
                        .into());
                    }
                }
            }
            Some(IdentitySource::Variables(vars)) => non_empty(&vars.package_min_os_version),
            None => None,
        };

        if let Some(version) = derived_version {
            let dir = self.kit_dir(version)?;
            logger.debug_with(
                "WindowsKitVersion was derived from the min OS version. Checking if it exists....",
                &json!({ "windowsKitVersion": version, "windowsKitPath": dir }),
            );
            if !exists(&dir).await {
                return Err(Diagnostic::fatal(
                    "windows_kit_derived_missing",
                    "WindowsKitVersion read from AppManifest but WindowsKit does not exist.",
                )
                .with_context(json!({ "windowsKitPath": dir }))
                .into());
            }
            let toolchain = binaries(&dir).await?;
            logger.debug_with(
                &format!("WindowsKit version {version} from AppxManifest exists. Getting binary paths."),
                &toolchain,
            );
            return Ok(toolchain);
        }

        let dir = self.kit_dir(DEFAULT_WINDOWS_KIT_VERSION)?;
        if !exists(&dir).await {
            return Err(Diagnostic::fatal(
                "windows_kit_default_missing",
                "No information on WindowsKitVersion was provided and default WindowsKit path does not exist.",
            )
            .with_context(json!({ "windowsKitPath": dir }))
            .into());
        }
        let toolchain = binaries(&dir).await?;
        logger.debug_with("Using default WindowsKit. Getting binary paths.", &toolchain);
        Ok(toolchain)
    }
}

/// Resolves the binaries with the standard [`ToolchainLocator`].
pub async fn locate_msix_tooling(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
    logger: &PackagingLogger,
) -> Result<Toolchain> {
    ToolchainLocator::new()
        .locate(options, manifest_vars, logger)
        .await
}

/// Checks that every binary exists in `dir`; the first missing one is fatal.
async fn binaries(dir: &Path) -> Result<Toolchain> {
    let toolchain = Toolchain::in_dir(dir);
    let expected = [
        ("MakeAppx", MAKE_APPX_EXE, &toolchain.make_appx),
        ("MakePri", MAKE_PRI_EXE, &toolchain.make_pri),
        ("SignTool", SIGN_TOOL_EXE, &toolchain.sign_tool),
        ("MakeCert", MAKE_CERT_EXE, &toolchain.make_cert),
    ];
    for (label, exe, path) in expected {
        if !exists(path).await {
            return Err(Diagnostic::fatal(
                "binary_missing",
                format!("{label} binary {exe} not found in:"),
            )
            .with_context(json!({ "windowsKitPath": dir }))
            .into());
        }
    }
    Ok(toolchain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ManifestGenerationVariables, PackagingOptionsBuilder};
    use tempfile::TempDir;

    fn fake_kit(root: &Path, version: &str, arch: &str) -> PathBuf {
        let dir = root.join(version).join(arch);
        std::fs::create_dir_all(&dir).unwrap();
        for exe in [MAKE_APPX_EXE, MAKE_PRI_EXE, SIGN_TOOL_EXE, MAKE_CERT_EXE] {
            std::fs::write(dir.join(exe), "").unwrap();
        }
        dir
    }

    fn setup() -> (TempDir, ToolchainLocator) {
        let tmp = tempfile::tempdir().unwrap();
        let locator = ToolchainLocator::new()
            .with_kit_root(tmp.path())
            .with_arch("x64");
        (tmp, locator)
    }

    fn message(err: crate::error::PackagingError) -> String {
        err.to_string()
    }

    fn base() -> PackagingOptionsBuilder {
        PackagingOptionsBuilder::new().output_dir("out")
    }

    #[tokio::test]
    async fn test_explicit_path_wins() {
        let (tmp, locator) = setup();
        let dir = fake_kit(tmp.path(), "custom", "bin");
        fake_kit(tmp.path(), DEFAULT_WINDOWS_KIT_VERSION, "x64");
        let options = base().windows_kit_path(&dir).windows_kit_version("10.0.1.0").build().unwrap();

        let toolchain = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap();
        assert_eq!(toolchain, Toolchain::in_dir(&dir));
    }

    #[tokio::test]
    async fn test_explicit_path_missing_is_fatal() {
        let (tmp, locator) = setup();
        let options = base().windows_kit_path(tmp.path().join("nope")).build().unwrap();
        let err = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap_err();
        assert_eq!(message(err), "The WindowsKitPath was provided but does not exist.");
    }

    #[tokio::test]
    async fn test_missing_binary_is_itemized() {
        let (tmp, locator) = setup();
        let dir = fake_kit(tmp.path(), "custom", "bin");
        std::fs::remove_file(dir.join(SIGN_TOOL_EXE)).unwrap();
        let options = base().windows_kit_path(&dir).build().unwrap();

        let err = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap_err();
        assert_eq!(err.context(), Some(&json!({ "windowsKitPath": dir })));
        assert_eq!(message(err), "SignTool binary SignTool.exe not found in:");
    }

    #[tokio::test]
    async fn test_explicit_version() {
        let (tmp, locator) = setup();
        let dir = fake_kit(tmp.path(), "10.0.22621.0", "x64");
        let options = base().windows_kit_version("10.0.22621.0").build().unwrap();
        let toolchain = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap();
        assert_eq!(toolchain.make_appx, dir.join("makeappx.exe"));
    }

    #[tokio::test]
    async fn test_explicit_version_missing_is_fatal() {
        let (_tmp, locator) = setup();
        let options = base().windows_kit_version("10.0.22621.0").build().unwrap();
        let err = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap_err();
        assert_eq!(message(err), "WindowsKitVersion was provided but does not exist.");
    }

    #[tokio::test]
    async fn test_old_kit_on_arm64_uses_x64() {
        let (tmp, locator) = setup();
        let locator = locator.with_arch("arm64");
        fake_kit(tmp.path(), "10.0.14393.42", "x64");
        let options = base().windows_kit_version("10.0.14393.42").build().unwrap();

        let toolchain = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap();
        assert!(toolchain.make_appx.ends_with(Path::new("x64").join("makeappx.exe")));
        assert!(toolchain.make_pri.ends_with(Path::new("x64").join("makepri.exe")));
        assert!(toolchain.sign_tool.ends_with(Path::new("x64").join("SignTool.exe")));
        assert!(toolchain.make_cert.ends_with(Path::new("x64").join("makecert.exe")));
    }

    #[tokio::test]
    async fn test_new_kit_on_arm64_keeps_arm64() {
        let (_tmp, locator) = setup();
        let locator = locator.with_arch("arm64");
        let dir = locator.kit_dir("10.0.22621.0").unwrap();
        assert!(dir.ends_with(Path::new("10.0.22621.0").join("arm64")));
    }

    #[tokio::test]
    async fn test_invalid_explicit_version() {
        let (_tmp, locator) = setup();
        let options = base().windows_kit_version("10.0").build().unwrap();
        let err = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap_err();
        assert_eq!(message(err), "Invalid Windows version string. {10.0}");
    }

    #[tokio::test]
    async fn test_version_from_manifest() {
        let (tmp, locator) = setup();
        let dir = fake_kit(tmp.path(), "10.0.17763.0", "x64");
        let options = base().app_manifest("AppxManifest.xml").build().unwrap();
        let vars = ManifestVariables {
            manifest_os_min_version: Some("10.0.17763.0".into()),
            ..Default::default()
        };
        let toolchain = locator
            .locate(&options, Some(&vars), &PackagingLogger::default())
            .await
            .unwrap();
        assert_eq!(toolchain, Toolchain::in_dir(&dir));
    }

    #[tokio::test]
    async fn test_manifest_without_version_is_fatal() {
        let (tmp, locator) = setup();
        fake_kit(tmp.path(), DEFAULT_WINDOWS_KIT_VERSION, "x64");
        let options = base().app_manifest("AppxManifest.xml").build().unwrap();
        let err = locator
            .locate(&options, Some(&ManifestVariables::default()), &PackagingLogger::default())
            .await
            .unwrap_err();
        assert_eq!(message(err), "Couldn't find Windows Kit version in AppManifest.");
    }

    #[tokio::test]
    async fn test_manifest_version_kit_missing_is_fatal() {
        let (_tmp, locator) = setup();
        let options = base().app_manifest("AppxManifest.xml").build().unwrap();
        let vars = ManifestVariables {
            manifest_os_min_version: Some("10.0.22621.0".into()),
            ..Default::default()
        };
        let err = locator
            .locate(&options, Some(&vars), &PackagingLogger::default())
            .await
            .unwrap_err();
        assert_eq!(
            message(err),
            "WindowsKitVersion read from AppManifest but WindowsKit does not exist."
        );
    }

    #[tokio::test]
    async fn test_version_from_variables() {
        let (tmp, locator) = setup();
        let dir = fake_kit(tmp.path(), "10.0.19041.0", "x64");
        let options = base()
            .manifest_variables(ManifestGenerationVariables {
                package_min_os_version: Some("10.0.19041.0".into()),
                ..Default::default()
            })
            .build()
            .unwrap();
        let toolchain = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap();
        assert_eq!(toolchain, Toolchain::in_dir(&dir));
    }

    #[tokio::test]
    async fn test_variables_without_version_use_default() {
        let (tmp, locator) = setup();
        let dir = fake_kit(tmp.path(), DEFAULT_WINDOWS_KIT_VERSION, "x64");
        let options = base()
            .manifest_variables(ManifestGenerationVariables::default())
            .build()
            .unwrap();
        let toolchain = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap();
        assert_eq!(toolchain, Toolchain::in_dir(&dir));
    }

    #[tokio::test]
    async fn test_default_kit_keeps_host_arch() {
        let (tmp, locator) = setup();
        let locator = locator.with_arch("arm64");
        let dir = fake_kit(tmp.path(), DEFAULT_WINDOWS_KIT_VERSION, "arm64");
        let options = base().build().unwrap();
        let toolchain = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap();
        assert_eq!(toolchain, Toolchain::in_dir(&dir));
    }

    #[tokio::test]
    async fn test_default_kit_missing_is_fatal() {
        let (tmp, locator) = setup();
        let options = base().build().unwrap();
        let err = locator.locate(&options, None, &PackagingLogger::default()).await.unwrap_err();
        assert_eq!(
            err.context(),
            Some(&json!({ "windowsKitPath": tmp.path().join(DEFAULT_WINDOWS_KIT_VERSION).join("x64") }))
        );
        assert_eq!(
            message(err),
            "No information on WindowsKitVersion was provided and default WindowsKit path does not exist."
        );
    }
}
