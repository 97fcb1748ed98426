//! Built-in package images.
//!
//! Used when no `packageAssets` directory is given. The file names are the
//! ones the generated manifest references, so a generated manifest and the
//! default assets always agree.

use crate::error::Result;
use crate::utils::fs::write_file;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Default asset file names and their edge length in pixels.
pub const DEFAULT_ASSETS: [(&str, u32); 3] = [
    ("icon.png", 50),
    ("Square44x44Logo.png", 44),
    ("Square150x150Logo.png", 150),
];

const BACKGROUND: Rgba<u8> = Rgba([0x2b, 0x2e, 0x3b, 0xff]);
const FOREGROUND: Rgba<u8> = Rgba([0x9f, 0xea, 0xf9, 0xff]);

/// Writes the default assets into `dir`.
pub async fn write_default_assets(dir: &Path) -> Result<()> {
    for (name, size) in DEFAULT_ASSETS {
        let png = render_logo(size)?;
        let path = dir.join(name);
        log::debug!("Writing default asset {}x{} to {}", size, size, path.display());
        write_file(&path, png).await?;
    }
    Ok(())
}

/// A square tile with a centered inset block, PNG-encoded.
fn render_logo(size: u32) -> Result<Vec<u8>> {
    let inset = size / 4;
    let image = RgbaImage::from_fn(size, size, |x, y| {
        let inside = (inset..size - inset).contains(&x) && (inset..size - inset).contains(&y);
        if inside { FOREGROUND } else { BACKGROUND }
    });

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}
