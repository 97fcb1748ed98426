//! Field lookup in an existing manifest.
//!
//! Only five values are needed downstream, so the document is parsed but not
//! validated against the AppX schema. A field that is not found stays `None`;
//! whether that matters is decided later (the toolchain locator, for one,
//! requires the minimum OS version).

use crate::error::{ErrorExt, PackagingError, Result};
use crate::settings::PackagingOptions;
use crate::utils::fs::exists;
use crate::utils::remove_file_extension;
use roxmltree::Document;
use serde::Serialize;

/// Values looked up in an existing `AppxManifest.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestVariables {
    /// First `MinVersion` attribute, normally on `TargetDeviceFamily`
    pub manifest_os_min_version: Option<String>,
    /// File stem of the first `Executable` attribute
    pub manifest_app_name: Option<String>,
    /// First `ProcessorArchitecture` attribute
    pub manifest_package_arch: Option<String>,
    /// `AllowExternalContent` is present and reads `true`
    pub manifest_is_sparse_package: bool,
    /// First `Publisher` attribute, normally on `Identity`
    pub manifest_publisher: Option<String>,
}

/// Reads the manifest named by `options`.
///
/// Returns `Ok(None)` when the package identity does not come from a
/// manifest, or when the manifest file is missing. Validation reports the
/// missing file with its own message.
pub async fn read_manifest_variables(
    options: &PackagingOptions,
) -> Result<Option<ManifestVariables>> {
    let Some(path) = options.app_manifest() else {
        return Ok(None);
    };
    if !exists(path).await {
        return Ok(None);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading app manifest", path)?;
    parse_manifest_variables(&content)
        .map(Some)
        .map_err(|error| PackagingError::ManifestParse {
            path: path.to_path_buf(),
            error,
        })
}

/// Looks up the manifest fields in an XML document.
pub fn parse_manifest_variables(
    content: &str,
) -> std::result::Result<ManifestVariables, roxmltree::Error> {
    let doc = Document::parse(content)?;

    let first_attribute = |name: &str| {
        doc.descendants()
            .find_map(|node| node.attribute(name))
            .map(str::to_string)
    };

    let manifest_app_name = first_attribute("Executable").map(|executable| {
        let file_name = executable
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(executable.as_str());
        remove_file_extension(file_name).to_string()
    });

    let manifest_is_sparse_package = doc.descendants().any(|node| {
        node.is_element()
            && node.tag_name().name() == "AllowExternalContent"
            && node.text().is_some_and(|text| text.trim() == "true")
    });

    Ok(ManifestVariables {
        manifest_os_min_version: first_attribute("MinVersion"),
        manifest_app_name,
        manifest_package_arch: first_attribute("ProcessorArchitecture"),
        manifest_is_sparse_package,
        manifest_publisher: first_attribute("Publisher"),
    })
}
