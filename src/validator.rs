//! Option validation.
//!
//! Checks run in a fixed order and stop at the first fatal finding. Gaps with
//! a documented default are warnings. A publisher that does not match the
//! signing certificate is reported at error severity but does not stop
//! packaging; SignTool will still be asked to sign, and the resulting package
//! will not install until the two agree.

use crate::diagnostic::{Diagnostic, ValidationReport};
use crate::error::Result;
use crate::logger::PackagingLogger;
use crate::manifest::ManifestVariables;
use crate::msix::{ToolRunner, cert_publisher};
use crate::settings::{IdentitySource, ManifestGenerationVariables, PackagingOptions, non_empty};
use crate::utils::fs::exists;
use crate::utils::remove_publisher_prefix;
use crate::version::is_valid_version;
use serde_json::json;

/// Appends a fatal finding and ends the checks.
macro_rules! fatal {
    ($report:ident, $code:literal, $message:expr) => {{
        $report.push(Diagnostic::fatal($code, $message));
        return Ok($report);
    }};
    ($report:ident, $code:literal, $message:expr, $context:expr) => {{
        $report.push(Diagnostic::fatal($code, $message).with_context($context));
        return Ok($report);
    }};
}

/// Runs every check and returns the findings.
///
/// Only a failure to run `certutil` is returned as `Err`; validation findings,
/// fatal ones included, end up in the report.
pub async fn check_options<R: ToolRunner>(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
    runner: &R,
    logger: &PackagingLogger,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::new();
    logger.debug_with("You are calling with following packaging options", options);

    match &options.identity {
        Some(IdentitySource::Variables(vars)) => {
            if let Some(fatal) = check_variables(vars, &mut report) {
                report.push(fatal);
                return Ok(report);
            }
        }
        Some(IdentitySource::AppManifest(path)) => {
            if !exists(path).await {
                fatal!(
                    report,
                    "app_manifest_missing",
                    "Path to application manifest <appManifest> does not exist.",
                    json!({ "appManifest": path })
                );
            }
        }
        None => fatal!(
            report,
            "no_identity_source",
            "Neither app manifest <appManifest> nor manifest variables <manifestVariables> provided."
        ),
    }

    let is_sparse = manifest_vars.is_some_and(|vars| vars.manifest_is_sparse_package);
    if !is_sparse {
        let Some(app_dir) = &options.app_dir else {
            fatal!(report, "app_dir_not_provided", "Path to application <appDir> not provided.");
        };
        if !exists(app_dir).await {
            fatal!(
                report,
                "app_dir_missing",
                "Path to application <appDir> does not exist.",
                json!({ "appDir": app_dir })
            );
        }
    }

    match &options.package_assets {
        None => report.push(Diagnostic::warning(
            "package_assets_default",
            "Path to packages assets <packageAssets> not provided, using default assets.",
        )),
        Some(assets) => {
            if !exists(assets).await {
                fatal!(
                    report,
                    "package_assets_missing",
                    "Path to packages assets provided but <packageAssets> does not exist.",
                    json!({ "packageAssets": assets })
                );
            }
        }
    }

    if options.cert.is_none() && options.sign_enabled() {
        let message = if options.cert_pass().is_some() {
            "Path to cert <cert> not provided. A dev cert will be created with the provided password and the package will be signed with it!"
        } else {
            "Path to cert <cert> and cert password <cert_pass> not provided. A dev cert will be created and the package will be signed with it!"
        };
        report.push(Diagnostic::warning("dev_cert", message));
    }

    if let Some(cert) = &options.cert {
        if options.custom_sign_params().is_some() {
            report.push(Diagnostic::warning(
                "sign_params_priority",
                "Path to cert <cert> and custom signParams provided. signParams will take priority!",
            ));
        }
        if !exists(cert).await {
            fatal!(
                report,
                "cert_missing",
                "Path to cert <cert> does not exist.",
                json!({ "cert": cert })
            );
        }
        match options.cert_pass() {
            None => report.push(Diagnostic::warning(
                "cert_pass_missing",
                "Cert cert password <cert_pass> not provided.",
            )),
            Some(password) => {
                let cert_publisher = cert_publisher(runner, cert, password, logger).await?;
                let manifest_publisher = expected_publisher(options, manifest_vars);
                if cert_publisher.is_none() || cert_publisher != manifest_publisher {
                    report.push(
                        Diagnostic::error(
                            "publisher_mismatch",
                            "The publisher in the manifest must match the publisher of the cert",
                        )
                        .with_context(json!({
                            "manifest_publisher": manifest_publisher,
                            "cert_publisher": cert_publisher,
                        })),
                    );
                }
            }
        }
    }

    Ok(report)
}

/// Validates `options`, logs the findings and fails on the first fatal one.
pub async fn verify_options<R: ToolRunner>(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
    runner: &R,
    logger: &PackagingLogger,
) -> Result<ValidationReport> {
    let report = check_options(options, manifest_vars, runner, logger).await?;
    for diagnostic in &report.diagnostics {
        logger.diagnostic(diagnostic);
    }
    report.into_result()
}

/// Publisher the certificate subject has to equal.
///
/// Generated manifests always carry `CN=`, so the variables publisher is
/// compared with the prefix added back.
fn expected_publisher(
    options: &PackagingOptions,
    manifest_vars: Option<&ManifestVariables>,
) -> Option<String> {
    match &options.identity {
        Some(IdentitySource::AppManifest(_)) => {
            manifest_vars.and_then(|vars| vars.manifest_publisher.clone())
        }
        Some(IdentitySource::Variables(vars)) => non_empty(&vars.publisher)
            .map(|publisher| format!("CN={}", remove_publisher_prefix(publisher))),
        None => None,
    }
}

/// Generation-variable checks. Returns the fatal finding, if any.
fn check_variables(
    vars: &ManifestGenerationVariables,
    report: &mut ValidationReport,
) -> Option<Diagnostic> {
    let missing = |value: &Option<String>| non_empty(value).is_none();

    match non_empty(&vars.package_version) {
        None => {
            return Some(Diagnostic::fatal(
                "package_version_missing",
                "Neither package version <packageVersion> nor app manifest <appManifest> provided.",
            ));
        }
        Some(version) if !is_valid_version(version) => {
            return Some(
                Diagnostic::fatal(
                    "package_version_invalid",
                    "Package version <packageVersion> is not a semantic version.",
                )
                .with_context(json!({ "packageVersion": version })),
            );
        }
        Some(_) => {}
    }
    if missing(&vars.publisher) {
        return Some(Diagnostic::fatal(
            "publisher_missing",
            "Neither publisher <publisher> nor app manifest <appManifest> provided.",
        ));
    }
    if missing(&vars.publisher_display_name) {
        report.push(Diagnostic::warning(
            "publisher_display_name_default",
            "Neither publisher display name <publisherDisplayName> nor app manifest <appManifest> provided. Using publisher as display name.",
        ));
    }
    if missing(&vars.package_display_name) {
        report.push(Diagnostic::warning(
            "package_display_name_default",
            "Neither package display name <packageDisplayName> nor app manifest <appManifest> provided. Using app executable as display name.",
        ));
    }
    if missing(&vars.app_executable) {
        return Some(Diagnostic::fatal(
            "app_executable_missing",
            "Neither app executable <appExecutable> nor app manifest <appManifest> provided.",
        ));
    }
    if missing(&vars.target_arch) {
        return Some(Diagnostic::fatal(
            "target_arch_missing",
            "Neither target architecture <targetArch> nor app manifest <appManifest> provided.",
        ));
    }
    if missing(&vars.package_min_os_version) {
        report.push(Diagnostic::warning(
            "min_os_version_default",
            "Neither package min OS version <packageMinOSVersion> nor app manifest <appManifest> provided. Using default OS version 10.0.14393.0.",
        ));
    }
    if missing(&vars.package_max_os_version_tested) {
        report.push(Diagnostic::warning(
            "max_os_version_tested_default",
            "Neither package max OS version tested <packageMaxOSVersionTested> nor app manifest <appManifest> provided. Using default OS version 10.0.14393.0.",
        ));
    }
    if missing(&vars.package_identity) {
        return Some(Diagnostic::fatal(
            "package_identity_missing",
            "Neither package identity <packageIdentity> nor app manifest <appManifest> provided.",
        ));
    }
    if missing(&vars.app_display_name) {
        report.push(Diagnostic::warning(
            "app_display_name_default",
            "Neither app display name <appDisplayName> nor app manifest <appManifest> provided. Using app executable as display name.",
        ));
    }
    if missing(&vars.package_description) {
        report.push(Diagnostic::warning(
            "package_description_default",
            "Neither package description <packageDescription> nor app manifest <appManifest> provided. Using app executable as description.",
        ));
    }
    if missing(&vars.package_background_color) {
        report.push(Diagnostic::warning(
            "background_color_default",
            "Neither package background color <packageBackgroundColor> nor app manifest <appManifest> provided. Using default background color transparent.",
        ));
    }
    None
}
