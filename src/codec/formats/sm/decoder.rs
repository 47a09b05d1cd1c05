//! Decoder for the song-level (`.sm`) format.

use crate::codec::Decoder;
use crate::error::{SimfileError, SimfileResult};
use crate::model::{Song, SourceFormat};
use crate::parse::parse_song;

// Safety limit to prevent memory exhaustion on hostile input.
const MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Decoder for `.sm` simfiles.
pub struct SmDecoder;

impl Decoder for SmDecoder {
    fn decode(data: &[u8]) -> SimfileResult<Song> {
        if data.len() > MAX_FILE_SIZE {
            return Err(SimfileError::InvalidFormat(format!(
                "File too large: {} bytes (max {}MB)",
                data.len(),
                MAX_FILE_SIZE / 1024 / 1024
            )));
        }
        let content = std::str::from_utf8(data)
            .map_err(|e| SimfileError::InvalidFormat(format!("Invalid UTF-8: {e}")))?;
        Ok(parse_song(content, SourceFormat::Sm))
    }
}
