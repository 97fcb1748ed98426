//! Four-part Windows version parsing and ordering.

use crate::error::{PackagingError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch.build` version, compared numerically part by part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowsVersion {
    /// Major
    pub major: u64,
    /// Minor
    pub minor: u64,
    /// Build number in Windows terms
    pub patch: u64,
    /// Revision
    pub build: u64,
}

impl WindowsVersion {
    /// Parses a version with exactly four numeric parts.
    pub fn parse(version: &str) -> Result<Self> {
        let invalid = || PackagingError::InvalidWindowsVersion(version.to_string());
        let parts = version
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;

        match parts.as_slice() {
            &[major, minor, patch, build] => Ok(Self {
                major,
                minor,
                patch,
                build,
            }),
            _ => Err(invalid()),
        }
    }

    /// Three-way comparison as `-1`, `0` or `1`.
    pub fn compare(&self, other: &Self) -> i32 {
        match self.cmp(other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// Whether `v1` is older than `v2`. Fails if either is not a Windows version.
    pub fn is_older(v1: &str, v2: &str) -> Result<bool> {
        Ok(Self::parse(v1)? < Self::parse(v2)?)
    }

    /// Whether `v1` is newer than `v2`.
    pub fn is_newer(v1: &str, v2: &str) -> Result<bool> {
        Ok(Self::parse(v1)? > Self::parse(v2)?)
    }

    /// Whether `v1` and `v2` denote the same version (`10.0.0.01` equals `10.0.0.1`).
    pub fn is_same(v1: &str, v2: &str) -> Result<bool> {
        Ok(Self::parse(v1)? == Self::parse(v2)?)
    }
}

impl FromStr for WindowsVersion {
    type Err = PackagingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for WindowsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}
