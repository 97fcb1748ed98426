//! Manifest generation from [`ManifestGenerationVariables`].
//!
//! Every optional field has its own fallback function so each rule can be
//! checked in isolation. `app_name` in these functions is the executable name
//! without its extension.

use crate::error::Result;
use crate::settings::{ManifestGenerationVariables, non_empty};
use crate::utils::{remove_file_extension, remove_publisher_prefix};
use crate::version::ensure_windows_version;
use handlebars::Handlebars;
use serde::Serialize;

/// OS version used when the variables name none.
pub const DEFAULT_OS_VERSION: &str = "10.0.14393.0";

/// Tile background used when the variables name none.
pub const DEFAULT_BACKGROUND_COLOR: &str = "transparent";

const MANIFEST_TEMPLATE: &str = include_str!("../../templates/AppxManifest.xml.hbs");

/// `VisualElements/@DisplayName`: app display name, package display name, app name.
pub fn app_display_name<'a>(vars: &'a ManifestGenerationVariables, app_name: &'a str) -> &'a str {
    non_empty(&vars.app_display_name)
        .or(non_empty(&vars.package_display_name))
        .unwrap_or(app_name)
}

/// `Properties/DisplayName`: package display name, app display name, app name.
pub fn display_name<'a>(vars: &'a ManifestGenerationVariables, app_name: &'a str) -> &'a str {
    non_empty(&vars.package_display_name)
        .or(non_empty(&vars.app_display_name))
        .unwrap_or(app_name)
}

/// `TargetDeviceFamily/@MinVersion`.
pub fn min_os_version(vars: &ManifestGenerationVariables) -> &str {
    non_empty(&vars.package_min_os_version).unwrap_or(DEFAULT_OS_VERSION)
}

/// `TargetDeviceFamily/@MaxVersionTested`: falls back to the min OS version.
pub fn max_os_version_tested(vars: &ManifestGenerationVariables) -> &str {
    non_empty(&vars.package_max_os_version_tested).unwrap_or_else(|| min_os_version(vars))
}

/// `PublisherDisplayName`: falls back to the publisher without `CN=`.
pub fn publisher_display_name<'a>(
    vars: &'a ManifestGenerationVariables,
    publisher_name: &'a str,
) -> &'a str {
    non_empty(&vars.publisher_display_name).unwrap_or(publisher_name)
}

/// `VisualElements/@Description`.
pub fn package_description<'a>(
    vars: &'a ManifestGenerationVariables,
    app_name: &'a str,
) -> &'a str {
    non_empty(&vars.package_description)
        .or(non_empty(&vars.package_display_name))
        .or(non_empty(&vars.app_display_name))
        .unwrap_or(app_name)
}

/// `VisualElements/@BackgroundColor`.
pub fn background_color(vars: &ManifestGenerationVariables) -> &str {
    non_empty(&vars.package_background_color).unwrap_or(DEFAULT_BACKGROUND_COLOR)
}

#[derive(Serialize)]
struct ManifestTemplate<'a> {
    identity_name: &'a str,
    processor_architecture: &'a str,
    version: String,
    publisher_name: &'a str,
    display_name: &'a str,
    publisher_display_name: &'a str,
    min_os_version: &'a str,
    max_os_version_tested: &'a str,
    executable_path: String,
    app_display_name: &'a str,
    package_description: &'a str,
    background_color: &'a str,
}

/// Renders `AppxManifest.xml` from generation variables.
///
/// The package version is normalized with [`ensure_windows_version`], which
/// fails for anything that is not a semantic or four-part version.
pub fn synthesize_manifest(vars: &ManifestGenerationVariables) -> Result<String> {
    let app_executable = non_empty(&vars.app_executable).unwrap_or_default();
    let app_name = remove_file_extension(app_executable);
    let publisher_name = remove_publisher_prefix(non_empty(&vars.publisher).unwrap_or_default());
    let version = ensure_windows_version(non_empty(&vars.package_version).unwrap_or_default())?;

    let data = ManifestTemplate {
        identity_name: non_empty(&vars.package_identity).unwrap_or_default(),
        processor_architecture: non_empty(&vars.target_arch).unwrap_or_default(),
        version,
        publisher_name,
        display_name: display_name(vars, app_name),
        publisher_display_name: publisher_display_name(vars, publisher_name),
        min_os_version: min_os_version(vars),
        max_os_version_tested: max_os_version_tested(vars),
        executable_path: format!("app\\{app_executable}"),
        app_display_name: app_display_name(vars, app_name),
        package_description: package_description(vars, app_name),
        background_color: background_color(vars),
    };

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(escape_xml);
    handlebars.register_template_string("manifest", MANIFEST_TEMPLATE)?;
    Ok(handlebars.render("manifest", &data)?)
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
