//! Error types for simfile operations.

use thiserror::Error;

/// Result type alias for simfile operations.
pub type SimfileResult<T> = Result<T, SimfileError>;

/// Errors that can occur while decoding or encoding simfiles.
///
/// Recoverable parse problems (malformed values, invalid timing entries,
/// row conflicts) are never surfaced here; they are logged and repaired at
/// the site of discovery. Only I/O problems, undecodable input and
/// per-chart structural failures become errors.
#[derive(Debug, Error)]
pub enum SimfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Unknown steps type: {0}")]
    UnknownStepsType(String),

    #[error("Invalid note data on player {player} lane {lane} at row {row}: {reason}")]
    InvalidNoteData {
        player: u8,
        lane: u8,
        row: i32,
        reason: &'static str,
    },

    #[error("Measure {measure} uses a subdivision with no editor-supported line count")]
    UnsupportedSubdivision { measure: usize },

    #[error("Chart event list violates ordering at row {row}")]
    MisorderedEvents { row: i32 },

    #[error("Hold on player {player} lane {lane} starting at row {row} is never released")]
    UnterminatedHold { player: u8, lane: u8, row: i32 },
}
