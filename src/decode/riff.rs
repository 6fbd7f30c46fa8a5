use anyhow::{Result, anyhow, bail};

const SIGNATURE: &[u8] = b"RIFF";
const ACON_TYPE: &[u8] = b"ACON";

/// One RIFF chunk: four-byte id plus a borrowed payload slice.
///
/// The payload excludes the pad byte that follows odd-length chunks.
#[derive(Debug, Clone, Copy)]
pub struct RiffChunk<'a> {
    pub id: [u8; 4],
    pub data: &'a [u8],
}

/// Forward-only walk over the chunks of a RIFF byte stream.
///
/// A declared chunk length that runs past the end of the buffer yields one
/// `Err` and ends the walk; trailing garbage shorter than a chunk header is
/// ignored.
#[derive(Debug)]
pub struct RiffChunks<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RiffChunks<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for RiffChunks<'a> {
    type Item = Result<RiffChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + 8 > self.data.len() {
            return None;
        }

        let mut id = [0u8; 4];
        id.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        let size = u32::from_le_bytes([
            self.data[self.pos + 4],
            self.data[self.pos + 5],
            self.data[self.pos + 6],
            self.data[self.pos + 7],
        ]) as usize;

        let start = self.pos + 8;
        let end = match start.checked_add(size) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                self.pos = self.data.len();
                return Some(Err(anyhow!(
                    "Chunk {} extends beyond file bounds",
                    id.escape_ascii()
                )));
            }
        };

        // Chunks are padded to a word boundary
        self.pos = end + (size & 1);

        Some(Ok(RiffChunk {
            id,
            data: &self.data[start..end],
        }))
    }
}

/// Checks the RIFF/ACON preamble and returns a walk over the top-level chunks.
pub fn acon_chunks(data: &[u8]) -> Result<RiffChunks<'_>> {
    if data.len() < 12 || &data[0..4] != SIGNATURE {
        bail!("Not a valid RIFF file");
    }
    if &data[8..12] != ACON_TYPE {
        bail!("Not an animated cursor file");
    }
    Ok(RiffChunks::new(&data[12..]))
}
