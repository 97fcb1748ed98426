//! Application manifest handling.
//!
//! A package either ships an existing `AppxManifest.xml` verbatim, or one is
//! generated from [`ManifestGenerationVariables`]. In the first case the few
//! fields the rest of the pipeline needs are looked up in the document
//! ([`read_manifest_variables`]); in the second they are known up front.

mod extract;
mod synthesize;

pub use extract::{ManifestVariables, parse_manifest_variables, read_manifest_variables};
pub use synthesize::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_OS_VERSION, app_display_name, background_color,
    display_name, max_os_version_tested, min_os_version, package_description,
    publisher_display_name, synthesize_manifest,
};

use crate::error::{ErrorExt, Result};
use crate::settings::{IdentitySource, ManifestGenerationVariables, PackagingOptions};

/// Resolves the manifest document for `options`.
///
/// Returns the file content when a manifest path was given, a generated
/// document when variables were given, and `None` when neither was.
pub async fn manifest_content(options: &PackagingOptions) -> Result<Option<String>> {
    match &options.identity {
        Some(IdentitySource::AppManifest(path)) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .fs_context("reading app manifest", path)?;
            Ok(Some(content))
        }
        Some(IdentitySource::Variables(vars)) => synthesize_manifest(vars).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PackagingOptionsBuilder;

    fn variables() -> ManifestGenerationVariables {
        ManifestGenerationVariables {
            app_executable: Some("HelloMSIX.exe".into()),
            target_arch: Some("x64".into()),
            package_identity: Some("com.electron.myapp".into()),
            package_version: Some("1.42.0.0".into()),
            publisher: Some("Jan Hannemann".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_manifest_content_passes_file_through() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("AppxManifest.xml");
        std::fs::write(&path, "<Package/>").unwrap();
        let options = PackagingOptionsBuilder::new()
            .output_dir(tmp.path())
            .app_manifest(&path)
            .build()
            .unwrap();
        assert_eq!(manifest_content(&options).await.unwrap().as_deref(), Some("<Package/>"));
    }

    #[tokio::test]
    async fn test_manifest_content_none_without_identity() {
        let options = PackagingOptionsBuilder::new().output_dir("out").build().unwrap();
        assert!(manifest_content(&options).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generated_manifest_round_trips_through_extraction() {
        let vars = ManifestGenerationVariables {
            target_arch: Some("arm64".into()),
            package_min_os_version: Some("10.0.17763.0".into()),
            ..variables()
        };
        let options = PackagingOptionsBuilder::new()
            .output_dir("out")
            .manifest_variables(vars)
            .build()
            .unwrap();
        let content = manifest_content(&options).await.unwrap().unwrap();

        let extracted = parse_manifest_variables(&content).unwrap();
        assert_eq!(extracted.manifest_package_arch.as_deref(), Some("arm64"));
        assert_eq!(extracted.manifest_os_min_version.as_deref(), Some("10.0.17763.0"));
        assert_eq!(extracted.manifest_publisher.as_deref(), Some("CN=Jan Hannemann"));
        assert_eq!(extracted.manifest_app_name.as_deref(), Some("HelloMSIX"));
        assert!(!extracted.manifest_is_sparse_package);
    }
}
