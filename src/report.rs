use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::decode::{self, CursorKind, DecodedCursor};

/// Conversion result for one cursor file.
///
/// Serializes to the camelCase JSON contract consumed by importers: on
/// success the metadata and image fields are set, on failure only `error`.
/// Absent fields are omitted, not null.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotspot_x: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotspot_y: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u32>,
    /// Seconds per frame; 0.0 for static cursors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_duration: Option<f64>,
    /// Base64 of the PNG-encoded sprite sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// File stem, set for entries of a folder report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ConversionReport {
    fn from_decoded(decoded: &DecodedCursor, image_data: String) -> Self {
        Self {
            success: true,
            width: Some(decoded.width),
            height: Some(decoded.height),
            hotspot_x: Some(decoded.hotspot.0),
            hotspot_y: Some(decoded.hotspot.1),
            frame_count: Some(decoded.frame_count),
            frame_duration: Some(decoded.frame_duration),
            image_data: Some(image_data),
            ..Self::default()
        }
    }

    fn failure(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}

/// Envelope for a folder conversion: per-file reports on success, a single
/// error otherwise.
#[derive(Debug, Serialize)]
pub struct FolderReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursors: Option<Vec<ConversionReport>>,
}

impl FolderReport {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            cursors: None,
        }
    }
}

/// Converts one cursor file. Failures become report data, never errors.
pub fn convert_file(path: &Path) -> ConversionReport {
    match try_convert(path) {
        Ok(report) => report,
        Err(err) => {
            log::warn!("Conversion of {} failed: {err:#}", path.display());
            ConversionReport::failure(format!("{err:#}"))
        }
    }
}

fn try_convert(path: &Path) -> Result<ConversionReport> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let kind = match CursorKind::from_path(path) {
        Some(kind) => kind,
        None => {
            let suffix = path
                .extension()
                .map_or(String::new(), |ext| format!(".{}", ext.to_string_lossy()));
            bail!("Unsupported file type: {suffix}");
        }
    };

    let data =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let decoded = decode::decode_cursor(&data, kind)?;
    let image_data = encode_png_base64(&decoded.image)?;

    log::debug!(
        "Converted {}: {}x{}, {} frame(s)",
        path.display(),
        decoded.width,
        decoded.height,
        decoded.frame_count
    );

    Ok(ConversionReport::from_decoded(&decoded, image_data))
}

/// Converts every cursor file directly inside `dir`, in parallel. Entries
/// are ordered by path and tagged with their file stem.
pub fn convert_folder(dir: &Path) -> FolderReport {
    if !dir.is_dir() {
        return FolderReport::failure(format!("Not a directory: {}", dir.display()));
    }

    let paths = match scan_cursor_files(dir) {
        Ok(paths) => paths,
        Err(err) => return FolderReport::failure(format!("{err:#}")),
    };

    let cursors = paths
        .par_iter()
        .map(|path| {
            let mut report = convert_file(path);
            report.filename = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
            report
        })
        .collect();

    FolderReport {
        success: true,
        error: None,
        cursors: Some(cursors),
    }
}

fn scan_cursor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && CursorKind::from_path(path).is_some() {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

/// PNG-encodes the sprite sheet and wraps it in standard base64.
fn encode_png_base64(image: &RgbaImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("Failed to encode image")?;
    Ok(STANDARD.encode(buffer.get_ref()))
}
