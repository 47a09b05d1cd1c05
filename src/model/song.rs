//! Song container.

use serde::{Deserialize, Serialize};

use super::chart::Chart;
use super::extras::Extras;

/// The simfile variant a song was read from. Writers use this to decide
/// whether preserved raw strings apply to their own output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Legacy song-level format (`.sm`).
    Sm,
    /// Per-chart format (`.ssc`).
    Ssc,
}

/// A parsed song: metadata plus an ordered collection of charts.
///
/// Built once by the parser, mutated only by higher-level tooling,
/// written once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub subtitle: String,
    pub artist: String,
    pub title_translit: String,
    pub subtitle_translit: String,
    pub artist_translit: String,
    pub genre: String,
    pub credit: String,
    pub banner: String,
    pub background: String,
    pub cd_title: String,
    pub lyrics_path: String,
    /// Music filename relative to the song directory.
    pub music: String,
    /// Preview sample start, in seconds.
    pub preview_start: Option<f64>,
    /// Preview sample length, in seconds.
    pub preview_length: Option<f64>,
    /// Seconds between the start of the music and beat 0.
    pub offset_seconds: Option<f64>,
    /// Display-tempo hint, parameters preserved verbatim (may be a single
    /// value, a `min:max` range, or the `*` literal; never interpreted).
    pub display_bpm: Option<Vec<String>>,
    pub charts: Vec<Chart>,
    pub extras: Extras,
    /// Format this song was parsed from, if it came from a file.
    pub source_format: Option<SourceFormat>,
}

impl Song {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset applied to a chart: the chart override when present, the
    /// song offset otherwise.
    #[must_use]
    pub fn offset_for(&self, chart: &Chart) -> f64 {
        chart
            .offset_seconds
            .or(self.offset_seconds)
            .unwrap_or(0.0)
    }
}
