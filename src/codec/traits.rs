//! Decoder and Encoder traits for the format front ends.

use std::path::Path;

use crate::emit::EmitOptions;
use crate::error::SimfileResult;
use crate::model::Song;

/// Trait for decoding a simfile variant into a [`Song`].
pub trait Decoder {
    /// Decode a song from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid UTF-8 or exceeds the
    /// size guard. Semantic problems inside the file do not fail the
    /// decode; they are logged and repaired or dropped.
    fn decode(data: &[u8]) -> SimfileResult<Song>;

    /// Decode a song from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains
    /// undecodable data.
    fn decode_from_path(path: impl AsRef<Path>) -> SimfileResult<Song> {
        let data = std::fs::read(path)?;
        Self::decode(&data)
    }
}

/// Trait for encoding a [`Song`] back into a simfile variant.
pub trait Encoder {
    /// Encode a song to raw bytes with explicit options.
    ///
    /// # Errors
    ///
    /// Emission is infallible for a validated model; individual charts
    /// that fail validation or their spacing policy are logged and
    /// skipped rather than failing the song.
    fn encode_with(song: &Song, options: &EmitOptions) -> SimfileResult<Vec<u8>>;

    /// Encode a song to raw bytes with default options.
    ///
    /// # Errors
    ///
    /// See [`Encoder::encode_with`].
    fn encode(song: &Song) -> SimfileResult<Vec<u8>> {
        Self::encode_with(song, &EmitOptions::default())
    }

    /// Encode a song to a string.
    ///
    /// # Errors
    ///
    /// See [`Encoder::encode_with`].
    fn encode_to_string(song: &Song, options: &EmitOptions) -> SimfileResult<String> {
        let data = Self::encode_with(song, options)?;
        String::from_utf8(data)
            .map_err(|e| crate::error::SimfileError::InvalidFormat(format!("Invalid UTF-8: {e}")))
    }

    /// Encode a song to a file path through a temp file with atomic
    /// rename, so the target is never partially overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the file cannot be written.
    fn encode_to_path(
        song: &Song,
        path: impl AsRef<Path>,
        options: &EmitOptions,
    ) -> SimfileResult<()> {
        let data = Self::encode_with(song, options)?;
        crate::io::write_atomic(path.as_ref(), &data)?;
        Ok(())
    }
}
