use anyhow::{Context, Result, bail};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Write};

/// Fill for frames whose pixel encoding defeats every decode route.
const PLACEHOLDER: Rgba<u8> = Rgba([255, 0, 255, 128]);

/// Leading fields of a BITMAPINFOHEADER.
#[derive(Debug)]
struct DibHeader {
    header_size: u32,
    width: i32,
    height: i32,
    _planes: u16,
    bit_count: u16,
    _compression: u32,
}

impl DibHeader {
    fn read(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        Ok(Self {
            header_size: cursor.read_u32::<LittleEndian>()?,
            width: cursor.read_i32::<LittleEndian>()?,
            height: cursor.read_i32::<LittleEndian>()?,
            _planes: cursor.read_u16::<LittleEndian>()?,
            bit_count: cursor.read_u16::<LittleEndian>()?,
            _compression: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// The stored height covers the color plane and the AND mask stacked
    /// together, so the real image height is half of it.
    fn actual_height(&self) -> u32 {
        self.height.unsigned_abs() / 2
    }
}

/// Decodes a raw DIB cursor payload into RGBA.
///
/// 32-bit and 24-bit images take dedicated paths. Anything else is handed
/// to the BMP codec; if that fails too, the result is a placeholder image
/// at the directory-declared `hint_width` x `hint_height`.
pub fn decode(data: &[u8], hint_width: u32, hint_height: u32) -> Result<RgbaImage> {
    let header = DibHeader::read(data)?;

    match header.bit_count {
        32 => decode_bgra32(data, &header),
        24 => decode_bgr24(data, &header),
        _ => match decode_with_bmp_codec(data, &header) {
            Ok(image) => Ok(image),
            Err(err) => {
                log::warn!(
                    "Failed to decode {}-bit DIB: {}; using placeholder",
                    header.bit_count,
                    err
                );
                Ok(RgbaImage::from_pixel(hint_width, hint_height, PLACEHOLDER))
            }
        },
    }
}

/// 32-bit DIB: bottom-up BGRA rows with no padding, alpha carried as-is.
fn decode_bgra32(data: &[u8], header: &DibHeader) -> Result<RgbaImage> {
    let width = usize::try_from(header.width).context("Invalid DIB width")?;
    let height = header.actual_height() as usize;
    let pixel_offset = header.header_size as usize;
    let row_size = width * 4;

    let end = row_size
        .checked_mul(height)
        .and_then(|len| len.checked_add(pixel_offset))
        .context("DIB dimensions overflow")?;
    if end > data.len() {
        bail!("32-bit DIB pixel data extends beyond payload");
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let start = pixel_offset + (height - 1 - y) * row_size;
        for bgra in data[start..start + row_size].chunks_exact(4) {
            pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
        }
    }

    RgbaImage::from_raw(width as u32, height as u32, pixels)
        .context("32-bit DIB buffer size mismatch")
}

/// 24-bit DIB: bottom-up BGR rows padded to 4 bytes, then a 1-bit AND mask
/// padded to 32-bit rows. A set mask bit makes the pixel transparent.
fn decode_bgr24(data: &[u8], header: &DibHeader) -> Result<RgbaImage> {
    let width = usize::try_from(header.width).context("Invalid DIB width")?;
    let height = header.actual_height() as usize;
    let pixel_offset = header.header_size as usize;
    let row_size = (width * 3).div_ceil(4) * 4;
    let mask_row_size = width.div_ceil(32) * 4;

    let mask_offset = row_size
        .checked_mul(height)
        .and_then(|len| len.checked_add(pixel_offset))
        .context("DIB dimensions overflow")?;
    if mask_offset > data.len() {
        bail!("24-bit DIB pixel data extends beyond payload");
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let start = pixel_offset + (height - 1 - y) * row_size;
        for x in 0..width {
            let px = start + x * 3;
            pixels.extend_from_slice(&[data[px + 2], data[px + 1], data[px], 255]);
        }
    }

    // Mask rows past the end of the payload leave their pixels opaque.
    for y in 0..height {
        let start = mask_offset + (height - 1 - y) * mask_row_size;
        for x in 0..width {
            if let Some(&byte) = data.get(start + x / 8) {
                if (byte >> (7 - x % 8)) & 1 != 0 {
                    pixels[(y * width + x) * 4 + 3] = 0;
                }
            }
        }
    }

    RgbaImage::from_raw(width as u32, height as u32, pixels)
        .context("24-bit DIB buffer size mismatch")
}

/// Wraps the DIB in a BMP file header and defers to the BMP codec.
///
/// The doubled DIB height makes the codec stack the AND mask on top of the
/// color plane, so the decode is cropped back to its lower half.
fn decode_with_bmp_codec(data: &[u8], header: &DibHeader) -> Result<RgbaImage> {
    let bmp = wrap_dib_in_bmp(data)?;
    let decoded = image::load_from_memory_with_format(&bmp, ImageFormat::Bmp)
        .context("Failed to decode DIB cursor image")?
        .to_rgba8();

    let height = header.actual_height();
    if height > 0 && decoded.height() == height * 2 {
        Ok(image::imageops::crop_imm(&decoded, 0, height, decoded.width(), height).to_image())
    } else {
        Ok(decoded)
    }
}

/// Builds a complete BMP file around raw DIB data.
fn wrap_dib_in_bmp(dib: &[u8]) -> Result<Vec<u8>> {
    if dib.len() < 40 {
        bail!("DIB data too small");
    }

    let header_size = u32::from_le_bytes([dib[0], dib[1], dib[2], dib[3]]);
    let file_size = 14 + dib.len() as u32;
    let pixel_data_offset = 14u32
        .checked_add(header_size)
        .and_then(|off| off.checked_add(palette_size(dib)))
        .context("DIB header size overflow")?;

    let mut bmp = Vec::with_capacity(14 + dib.len());
    bmp.write_all(b"BM")?;
    bmp.write_u32::<LittleEndian>(file_size)?;
    bmp.write_u16::<LittleEndian>(0)?;
    bmp.write_u16::<LittleEndian>(0)?;
    bmp.write_u32::<LittleEndian>(pixel_data_offset)?;
    bmp.write_all(dib)?;

    Ok(bmp)
}

fn palette_size(dib: &[u8]) -> u32 {
    let bits_per_pixel = u16::from_le_bytes([dib[14], dib[15]]);
    let colors_used = u32::from_le_bytes([dib[32], dib[33], dib[34], dib[35]]);

    let entries = if colors_used > 0 {
        colors_used
    } else if bits_per_pixel <= 8 {
        1 << bits_per_pixel
    } else {
        0
    };

    // Each palette entry is an RGBQUAD
    entries.saturating_mul(4)
}
