//! Prelude module for convenient imports.
//!
//! Import everything you need with a single use statement:
//! ```
//! use simfile_exchange::prelude::*;
//! ```

pub use crate::codec::{Decoder, Encoder, SmDecoder, SmEncoder, SscDecoder, SscEncoder};
pub use crate::emit::{EmitOptions, PropertyPolicy, SpacingPolicy};
pub use crate::error::{SimfileError, SimfileResult};
pub use crate::io::{CancellationToken, LoadOutcome, load_song, save_song};
pub use crate::model::{
    Chart, Difficulty, Event, EventKind, EventLayer, Extras, HoldKind, Song, SourceFormat,
    StepsType, TapKind,
};
