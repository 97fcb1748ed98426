//! Package version validation and normalization.
//!
//! Windows package versions cannot express prerelease or build metadata, so
//! `1.2.3-beta.1+ci.7` is packaged as `1.2.3.0`. The suffix is dropped on
//! purpose; callers that need distinct package versions per prerelease must
//! encode that in the numeric parts themselves.

use crate::error::{PackagingError, Result};
use regex::Regex;
use std::sync::LazyLock;

static WINDOWS_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+$").expect("Windows version regex is valid")
});

static THREE_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("three-part version regex is valid"));

/// Whether `version` is a semantic version or a four-part Windows version.
pub fn is_valid_version(version: &str) -> bool {
    semver::Version::parse(version).is_ok() || WINDOWS_VERSION_RE.is_match(version)
}

/// Converts a package version to the four-part form used in the manifest.
///
/// Four-part versions pass through, three-part versions get `.0` appended, and
/// semantic versions lose everything from the first `-` or `+` before `.0` is
/// appended.
///
/// # Errors
///
/// Returns [`PackagingError::InvalidSemanticVersion`] for anything that is
/// neither semantic nor four-part.
pub fn ensure_windows_version(version: &str) -> Result<String> {
    if WINDOWS_VERSION_RE.is_match(version) {
        return Ok(version.to_string());
    }
    if THREE_PART_RE.is_match(version) {
        return Ok(format!("{version}.0"));
    }
    if !is_valid_version(version) {
        return Err(PackagingError::InvalidSemanticVersion(version.to_string()));
    }

    let core = version
        .split_once(['-', '+'])
        .map_or(version, |(core, _)| core);
    Ok(format!("{core}.0"))
}
