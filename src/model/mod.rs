//! Data model for the simfile family.

mod chart;
mod event;
mod extras;
mod song;

pub use chart::{Chart, Difficulty, StepsType};
pub use event::{
    BEATS_PER_MEASURE, Event, EventKind, EventLayer, HoldKind, ROWS_PER_BEAT, ROWS_PER_MEASURE,
    TapKind, VALID_SUBDIVISIONS,
};
pub use extras::{
    Extra, Extras, KEYSOUND_INDEX, SOURCE_BEAT, SOURCE_LINE_COUNT, SOURCE_LINE_INDEX, SOURCE_TIME,
};
pub use song::{Song, SourceFormat};
