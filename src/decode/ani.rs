use anyhow::{Result, bail};
use image::RgbaImage;
use image::imageops::{self, FilterType};

use super::DecodedCursor;
use super::directory::IconDir;
use super::image_data;
use super::riff;

/// Display rate assumed when a file carries no usable anih chunk, in
/// jiffies per frame.
const FALLBACK_DISPLAY_RATE: u32 = 10;

/// The fixed 36-byte anih payload. Shorter payloads count as no header.
#[derive(Debug)]
struct AniHeader {
    _header_size: u32,
    num_frames: u32,
    num_steps: u32,
    _width: u32,
    _height: u32,
    _bit_count: u32,
    _planes: u32,
    display_rate: u32,
    _flags: u32,
}

impl AniHeader {
    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 36 {
            return None;
        }
        let dword =
            |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

        Some(Self {
            _header_size: dword(0),
            num_frames: dword(4),
            num_steps: dword(8),
            _width: dword(12),
            _height: dword(16),
            _bit_count: dword(20),
            _planes: dword(24),
            display_rate: dword(28),
            _flags: dword(32),
        })
    }

    fn fallback(frame_count: u32) -> Self {
        Self {
            _header_size: 36,
            num_frames: frame_count,
            num_steps: frame_count,
            _width: 0,
            _height: 0,
            _bit_count: 0,
            _planes: 0,
            display_rate: FALLBACK_DISPLAY_RATE,
            _flags: 0,
        }
    }
}

/// One decoded animation frame before composition.
struct AniFrame {
    image: RgbaImage,
    hotspot: (u16, u16),
}

/// Decodes a whole ANI file into a single vertically stacked sprite sheet.
///
/// Frames keep their storage order; `seq ` reordering is not applied. The
/// per-frame rate table collapses into one mean duration.
pub fn assemble(data: &[u8]) -> Result<DecodedCursor> {
    let mut header: Option<AniHeader> = None;
    let mut rates: Vec<u32> = Vec::new();
    let mut frames: Vec<AniFrame> = Vec::new();

    for chunk in riff::acon_chunks(data)? {
        let chunk = chunk?;
        match &chunk.id {
            b"anih" => header = AniHeader::parse(chunk.data),
            b"rate" => {
                let known = header.as_ref().map_or(0, |h| h.num_frames);
                rates = parse_rates(chunk.data, known);
            }
            b"LIST" => {
                if chunk.data.starts_with(b"fram") {
                    frames = decode_frame_list(&chunk.data[4..])?;
                }
            }
            _ => {}
        }
    }

    if frames.is_empty() {
        bail!("No frames found in ANI file");
    }

    let header = header.unwrap_or_else(|| AniHeader::fallback(frames.len() as u32));
    let frame_duration = if rates.is_empty() {
        f64::from(header.display_rate) / 60.0
    } else {
        let total: u64 = rates.iter().map(|&rate| u64::from(rate)).sum();
        total as f64 / rates.len() as f64 / 60.0
    };

    log::debug!(
        "Assembling {} frames ({} declared, {} steps) at {:.4}s per frame",
        frames.len(),
        header.num_frames,
        header.num_steps,
        frame_duration
    );

    Ok(compose_sheet(&frames, frame_duration))
}

/// Jiffie counts, whole dwords only, clipped to the frame count known when
/// the chunk appears.
fn parse_rates(data: &[u8], known_frames: u32) -> Vec<u32> {
    data.chunks_exact(4)
        .take(known_frames as usize)
        .map(|dword| u32::from_le_bytes([dword[0], dword[1], dword[2], dword[3]]))
        .collect()
}

/// Decodes every icon chunk in a fram list, dropping frames that fail.
fn decode_frame_list(data: &[u8]) -> Result<Vec<AniFrame>> {
    let mut frames = Vec::new();
    for (index, chunk) in riff::RiffChunks::new(data).enumerate() {
        let chunk = chunk?;
        if &chunk.id != b"icon" {
            continue;
        }
        match decode_icon(chunk.data) {
            Ok(frame) => frames.push(frame),
            Err(err) => log::warn!("Skipping frame {index}: {err}"),
        }
    }
    Ok(frames)
}

/// One icon chunk: a nested single-image icon file.
fn decode_icon(data: &[u8]) -> Result<AniFrame> {
    let dir = IconDir::parse_frame(data)?;
    let entry = &dir.entries[0];
    let image = image_data::decode(entry.payload(data)?, entry)?;

    Ok(AniFrame {
        image,
        hotspot: (entry.hotspot_x, entry.hotspot_y),
    })
}

/// Stacks frames vertically at frame 0's size, resizing any stragglers.
fn compose_sheet(frames: &[AniFrame], frame_duration: f64) -> DecodedCursor {
    let (width, height) = frames[0].image.dimensions();

    let mut sheet = RgbaImage::new(width, height * frames.len() as u32);
    for (index, frame) in frames.iter().enumerate() {
        let y = i64::from(index as u32 * height);
        if frame.image.dimensions() == (width, height) {
            imageops::replace(&mut sheet, &frame.image, 0, y);
        } else {
            let resized = imageops::resize(&frame.image, width, height, FilterType::Lanczos3);
            imageops::replace(&mut sheet, &resized, 0, y);
        }
    }

    DecodedCursor {
        width,
        height,
        hotspot: frames[0].hotspot,
        frame_count: frames.len() as u32,
        frame_duration,
        image: sheet,
    }
}
