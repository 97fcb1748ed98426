//! Package and Windows Kit version handling.
//!
//! Two kinds of version strings flow through packaging:
//!
//! - **Windows versions** (`10.0.22621.0`): exactly four numeric parts. Used
//!   for Windows Kit directories and manifest OS versions, ordered with
//!   [`WindowsVersion`].
//! - **Package versions**: what the caller writes, either semantic
//!   (`1.2.3-beta.1`) or already Windows-shaped. [`ensure_windows_version`]
//!   turns them into the four-part form the manifest requires.

mod semantic;
mod windows;

pub use semantic::{ensure_windows_version, is_valid_version};
pub use windows::WindowsVersion;
