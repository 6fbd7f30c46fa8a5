use anyhow::{Result, bail};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

const TYPE_ICON: u16 = 1;
const TYPE_CURSOR: u16 = 2;

/// One 16-byte ICONDIRENTRY with the zero-means-256 dimension encoding
/// already resolved.
#[derive(Debug, Clone)]
pub struct IconDirEntry {
    pub width: u32,
    pub height: u32,
    pub color_count: u8,
    pub hotspot_x: u16,
    pub hotspot_y: u16,
    pub size_bytes: u32,
    pub offset: u32,
}

impl IconDirEntry {
    /// The raw image payload this entry points at, bounds-checked against
    /// the containing file.
    pub fn payload<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let offset = self.offset as usize;
        let size = self.size_bytes as usize;
        match offset.checked_add(size) {
            Some(end) if end <= data.len() => Ok(&data[offset..end]),
            _ => bail!("Image data extends beyond file bounds"),
        }
    }
}

/// Parsed ICONDIR entry table. Always holds at least one entry.
#[derive(Debug, Clone)]
pub struct IconDir {
    pub entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Parses the directory of a standalone `.cur` file. The type tag must
    /// mark a cursor.
    pub fn parse_cursor(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let (file_type, count) = Self::read_header(&mut cursor)?;

        if file_type != TYPE_CURSOR {
            bail!("Not a cursor file (type={file_type}, expected {TYPE_CURSOR})");
        }
        if count < 1 {
            bail!("No cursor images in file");
        }

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(Self::read_entry(&mut cursor)?);
        }

        Ok(Self { entries })
    }

    /// Parses the directory of an icon payload embedded in an animation.
    /// Both icon and cursor type tags occur in the wild; animation frames
    /// carry a single image, so only the first entry is kept.
    pub fn parse_frame(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let (file_type, count) = Self::read_header(&mut cursor)?;

        if file_type != TYPE_ICON && file_type != TYPE_CURSOR {
            bail!("Not an icon or cursor directory (type={file_type})");
        }
        if count < 1 {
            bail!("No images in frame directory");
        }

        let entry = Self::read_entry(&mut cursor)?;
        Ok(Self {
            entries: vec![entry],
        })
    }

    /// The entry with the largest pixel area. Earlier entries win ties.
    pub fn best_entry(&self) -> &IconDirEntry {
        let mut best = &self.entries[0];
        for entry in &self.entries[1..] {
            if entry.width * entry.height > best.width * best.height {
                best = entry;
            }
        }
        best
    }

    fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<(u16, u16)> {
        let _reserved = cursor.read_u16::<LittleEndian>()?;
        let file_type = cursor.read_u16::<LittleEndian>()?;
        let count = cursor.read_u16::<LittleEndian>()?;
        Ok((file_type, count))
    }

    fn read_entry(cursor: &mut Cursor<&[u8]>) -> Result<IconDirEntry> {
        let width = cursor.read_u8()?;
        let height = cursor.read_u8()?;
        let color_count = cursor.read_u8()?;
        let _reserved = cursor.read_u8()?;

        Ok(IconDirEntry {
            width: if width == 0 { 256 } else { u32::from(width) },
            height: if height == 0 { 256 } else { u32::from(height) },
            color_count,
            hotspot_x: cursor.read_u16::<LittleEndian>()?,
            hotspot_y: cursor.read_u16::<LittleEndian>()?,
            size_bytes: cursor.read_u32::<LittleEndian>()?,
            offset: cursor.read_u32::<LittleEndian>()?,
        })
    }
}
