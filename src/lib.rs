//! # Simfile Exchange
//!
//! A conversion library for the StepMania simfile family. Parses the
//! legacy song-level format (`.sm`) and the newer per-chart format
//! (`.ssc`) into one in-memory model, re-derives row, time and measure
//! coordinates for every chart event, and writes either format back with
//! minimal round-trip drift.

#![warn(clippy::pedantic)]

pub mod codec;
pub mod emit;
pub mod error;
pub mod ini;
pub mod io;
pub mod model;
pub mod msd;
pub mod parse;
pub mod prelude;

// Re-exports for convenience
pub use codec::{Decoder, Encoder, SmDecoder, SmEncoder, SscDecoder, SscEncoder};
pub use emit::{EmitOptions, PropertyPolicy, SpacingPolicy};
pub use error::{SimfileError, SimfileResult};
pub use io::{CancellationToken, LoadOutcome, load_song, save_song};
pub use model::{
    Chart, Difficulty, Event, EventKind, EventLayer, Extras, HoldKind, Song, SourceFormat,
    StepsType, TapKind,
};
