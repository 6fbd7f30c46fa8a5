use std::path::PathBuf;

use clap::Parser;

/// Decode Windows cursors (.cur/.ani) into sprite sheets.
///
/// Prints one JSON document to stdout: metadata plus the base64-wrapped,
/// PNG-encoded pixel data. Animated cursors come out as a single image
/// with the frames stacked vertically.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// A .cur/.ani file, or a directory of them with --folder
    pub path: PathBuf,

    /// Convert every cursor file directly inside PATH (non-recursive)
    #[arg(long)]
    pub folder: bool,
}
