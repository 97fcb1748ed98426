//! Package layout directory.

use super::assets::write_default_assets;
use crate::error::{Context, Result};
use crate::logger::PackagingLogger;
use crate::program::ProgramOptions;
use crate::utils::fs::{copy_dir, write_file};

/// Fills the layout directory that `makeappx` packs.
///
/// - the resolved manifest goes to `AppxManifest.xml`
/// - `packageAssets` (or the built-in images) goes to `assets/`
/// - the app directory goes to `app/`, except for sparse packages
pub async fn create_layout(program: &ProgramOptions, logger: &PackagingLogger) -> Result<()> {
    logger.debug_with("Writing app manifest", &program.app_manifest_layout);
    write_file(&program.app_manifest_layout, &program.manifest_content).await?;

    match &program.assets_in {
        Some(assets) => {
            logger.debug_with("Copying package assets", assets);
            copy_dir(assets, &program.assets_layout)
                .await
                .context("copying package assets")?;
        }
        None => {
            logger.debug("Writing default package assets");
            write_default_assets(&program.assets_layout).await?;
        }
    }

    if program.is_sparse_package {
        logger.debug("Sparse package, not copying the app directory");
        return Ok(());
    }

    let app_dir = program
        .app_dir
        .as_deref()
        .context("Path to application <appDir> not provided.")?;
    logger.debug_with("Copying app directory", app_dir);
    copy_dir(app_dir, &program.app_layout)
        .await
        .context("copying app directory")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msix::DEFAULT_ASSETS;
    use crate::msix::testing::program;

    #[tokio::test]
    async fn test_layout_with_default_assets() {
        let dir = tempfile::tempdir().unwrap();
        let program = program(dir.path());
        let app = program.app_dir.clone().unwrap();
        tokio::fs::create_dir_all(app.join("resources")).await.unwrap();
        tokio::fs::write(app.join("hellomsix.exe"), b"MZ").await.unwrap();
        tokio::fs::write(app.join("resources").join("app.asar"), b"asar")
            .await
            .unwrap();

        create_layout(&program, &PackagingLogger::default()).await.unwrap();

        let manifest = tokio::fs::read_to_string(&program.app_manifest_layout)
            .await
            .unwrap();
        assert_eq!(manifest, "<Package/>");
        for (name, _) in DEFAULT_ASSETS {
            assert!(program.assets_layout.join(name).is_file(), "{name} missing");
        }
        assert!(program.app_layout.join("hellomsix.exe").is_file());
        assert!(program.app_layout.join("resources").join("app.asar").is_file());
    }

    #[tokio::test]
    async fn test_layout_copies_supplied_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        let assets = dir.path().join("my_assets");
        tokio::fs::create_dir_all(&assets).await.unwrap();
        tokio::fs::write(assets.join("StoreLogo.png"), b"png").await.unwrap();
        tokio::fs::create_dir_all(program.app_dir.as_ref().unwrap())
            .await
            .unwrap();
        program.assets_in = Some(assets);

        create_layout(&program, &PackagingLogger::default()).await.unwrap();

        assert!(program.assets_layout.join("StoreLogo.png").is_file());
        assert!(!program.assets_layout.join("icon.png").exists());
    }

    #[tokio::test]
    async fn test_sparse_layout_has_no_app() {
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(dir.path());
        program.is_sparse_package = true;
        program.app_dir = None;

        create_layout(&program, &PackagingLogger::default()).await.unwrap();

        assert!(program.app_manifest_layout.is_file());
        assert!(!program.app_layout.exists());
    }
}
