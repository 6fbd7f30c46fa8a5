pub mod ani;
pub mod dib;
pub mod directory;
pub mod image_data;
pub mod riff;


use std::path::Path;

use anyhow::Result;
use image::RgbaImage;

use self::directory::IconDir;

/// Cursor container kind as declared by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// Static cursor (.cur)
    Cur,
    /// Animated cursor (.ani)
    Ani,
}

impl CursorKind {
    /// Picks the kind from the extension alone, case-insensitively. File
    /// content is never sniffed.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "cur" => Some(Self::Cur),
            "ani" => Some(Self::Ani),
            _ => None,
        }
    }
}

/// A fully decoded cursor: a single frame, or every animation frame
/// stacked vertically in one sheet.
#[derive(Debug, Clone)]
pub struct DecodedCursor {
    pub width: u32,
    pub height: u32,
    /// Click point in frame coordinates, from the directory entry.
    pub hotspot: (u16, u16),
    pub frame_count: u32,
    /// Seconds per frame; 0.0 for static cursors.
    pub frame_duration: f64,
    pub image: RgbaImage,
}

/// Decodes raw cursor file bytes according to the declared kind.
///
/// Malformed input comes back as an error value, never a panic.
pub fn decode_cursor(data: &[u8], kind: CursorKind) -> Result<DecodedCursor> {
    match kind {
        CursorKind::Cur => decode_cur(data),
        CursorKind::Ani => ani::assemble(data),
    }
}

/// Static cursor: decode the highest-resolution directory entry.
fn decode_cur(data: &[u8]) -> Result<DecodedCursor> {
    let dir = IconDir::parse_cursor(data)?;
    let entry = dir.best_entry();
    let image = image_data::decode(entry.payload(data)?, entry)?;

    Ok(DecodedCursor {
        width: image.width(),
        height: image.height(),
        hotspot: (entry.hotspot_x, entry.hotspot_y),
        frame_count: 1,
        frame_duration: 0.0,
        image,
    })
}
