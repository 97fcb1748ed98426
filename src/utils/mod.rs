//! Small helpers shared across the pipeline.

pub mod fs;

/// Strips the last extension: `HelloMSIX.blabla.exe` becomes `HelloMSIX.blabla`.
///
/// Names without a dot are returned unchanged.
pub fn remove_file_extension(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

/// Strips a leading `CN=` from a certificate subject.
pub fn remove_publisher_prefix(publisher: &str) -> &str {
    publisher.strip_prefix("CN=").unwrap_or(publisher)
}
