//! File system utilities for building the package layout.
//!
//! Thin async wrappers that attach the touched path to every I/O error.

use crate::error::{ErrorExt, PackagingError, Result};
use std::path::Path;
use tokio::fs;

/// Whether `path` exists. Permission errors count as "does not exist".
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Creates all of the directories of the specified path.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes everything inside `path` but keeps the directory itself.
pub async fn empty_dir(path: &Path) -> Result<()> {
    let mut entries = fs::read_dir(path).await.fs_context("reading directory", path)?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading directory", path)?
    {
        let entry_path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .fs_context("inspecting entry", &entry_path)?;
        if file_type.is_dir() {
            fs::remove_dir_all(&entry_path)
                .await
                .fs_context("removing directory", &entry_path)?;
        } else {
            fs::remove_file(&entry_path)
                .await
                .fs_context("removing file", &entry_path)?;
        }
    }
    Ok(())
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    fs::write(path, contents).await.fs_context("writing file", path)
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Fails if the source path is not a directory or doesn't exist. Symlinks are
/// followed and their targets copied.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !exists(from).await {
        return Err(PackagingError::GenericError(format!(
            "{from:?} does not exist"
        )));
    }
    if !from.is_dir() {
        return Err(PackagingError::GenericError(format!(
            "{from:?} is not a Directory"
        )));
    }
    ensure_dir(to).await?;

    for entry in walkdir::WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        debug_assert!(entry.path().starts_with(from));
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_dir() {
            ensure_dir(&dest_path).await?;
        } else {
            fs::copy(entry.path(), &dest_path)
                .await
                .fs_context("copying file", entry.path())?;
        }
    }

    Ok(())
}
