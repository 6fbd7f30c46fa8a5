use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};

use super::dib;
use super::directory::IconDirEntry;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Decodes one directory entry's image payload into RGBA.
///
/// Modern cursors embed a whole PNG stream; legacy ones use a raw DIB. The
/// leading signature picks the route, never trial and error.
pub fn decode(data: &[u8], entry: &IconDirEntry) -> Result<RgbaImage> {
    if data.starts_with(PNG_SIGNATURE) {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Png)
            .context("Failed to decode PNG cursor image")?;
        Ok(decoded.to_rgba8())
    } else {
        dib::decode(data, entry.width, entry.height)
    }
}
