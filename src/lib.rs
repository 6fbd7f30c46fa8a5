// Library exports for cur2sheet

pub mod cli;
pub mod decode;
pub mod report;

// Re-export the types most callers need
pub use decode::{CursorKind, DecodedCursor, decode_cursor};
pub use report::{ConversionReport, FolderReport, convert_file, convert_folder};
