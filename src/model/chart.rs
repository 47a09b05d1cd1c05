//! Charts, steps types and difficulties.

use serde::{Deserialize, Serialize};

use crate::error::{SimfileError, SimfileResult};

use super::event::{EventKind, EventLayer};
use super::extras::Extras;

/// Play-style identifier. The closed set determines player and input
/// counts through a static table; charts with a steps type outside the
/// table are discarded at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepsType {
    DanceSingle,
    DanceDouble,
    DanceCouple,
    DanceSolo,
    DanceThreepanel,
    DanceRoutine,
    PumpSingle,
    PumpDouble,
    PumpCouple,
    PumpHalfdouble,
    PumpRoutine,
}

impl StepsType {
    /// Look a steps type up by its file tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "dance-single" => Some(Self::DanceSingle),
            "dance-double" => Some(Self::DanceDouble),
            "dance-couple" => Some(Self::DanceCouple),
            "dance-solo" => Some(Self::DanceSolo),
            "dance-threepanel" => Some(Self::DanceThreepanel),
            "dance-routine" => Some(Self::DanceRoutine),
            "pump-single" => Some(Self::PumpSingle),
            "pump-double" => Some(Self::PumpDouble),
            "pump-couple" => Some(Self::PumpCouple),
            "pump-halfdouble" => Some(Self::PumpHalfdouble),
            "pump-routine" => Some(Self::PumpRoutine),
            _ => None,
        }
    }

    /// File tag of this steps type.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::DanceSingle => "dance-single",
            Self::DanceDouble => "dance-double",
            Self::DanceCouple => "dance-couple",
            Self::DanceSolo => "dance-solo",
            Self::DanceThreepanel => "dance-threepanel",
            Self::DanceRoutine => "dance-routine",
            Self::PumpSingle => "pump-single",
            Self::PumpDouble => "pump-double",
            Self::PumpCouple => "pump-couple",
            Self::PumpHalfdouble => "pump-halfdouble",
            Self::PumpRoutine => "pump-routine",
        }
    }

    /// Number of players the style is danced by.
    #[must_use]
    pub fn num_players(self) -> u8 {
        match self {
            Self::DanceCouple | Self::DanceRoutine | Self::PumpCouple | Self::PumpRoutine => 2,
            _ => 1,
        }
    }

    /// Number of input columns across all players.
    #[must_use]
    pub fn num_inputs(self) -> u8 {
        match self {
            Self::DanceThreepanel => 3,
            Self::DanceSingle => 4,
            Self::PumpSingle => 5,
            Self::DanceSolo | Self::PumpHalfdouble => 6,
            Self::DanceDouble | Self::DanceCouple | Self::DanceRoutine => 8,
            Self::PumpDouble | Self::PumpCouple | Self::PumpRoutine => 10,
        }
    }
}

/// Named difficulty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Challenge,
    Edit,
}

impl Difficulty {
    /// Look a difficulty up by name, accepting the legacy aliases that
    /// appear in older files.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "easy" | "basic" | "light" => Some(Self::Easy),
            "medium" | "another" | "trick" | "standard" | "difficult" | "freestyle" => {
                Some(Self::Medium)
            }
            "hard" | "ssr" | "maniac" | "heavy" => Some(Self::Hard),
            "challenge" | "smaniac" | "expert" | "oni" | "crazy" | "nightmare" => {
                Some(Self::Challenge)
            }
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }

    /// Canonical name used when writing.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Challenge => "Challenge",
            Self::Edit => "Edit",
        }
    }
}

/// A single difficulty's worth of steps plus its header fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub steps_type: StepsType,
    pub difficulty: Difficulty,
    pub meter: i32,
    pub description: String,
    pub chart_name: String,
    pub credit: String,
    pub step_artist: String,
    /// Difficulty-profile vector, preserved verbatim; interpretation is
    /// game-specific.
    pub radar_values: Vec<f64>,
    /// Per-chart music file override.
    pub music: Option<String>,
    /// Per-chart offset from the music start, in seconds.
    pub offset_seconds: Option<f64>,
    /// Display-tempo hint, parameters preserved verbatim.
    pub display_bpm: Option<Vec<String>>,
    pub events: EventLayer,
    /// True when the chart carried its own timing tables, suppressing the
    /// song-level tables for this chart.
    pub owns_timing: bool,
    pub extras: Extras,
}

impl Chart {
    #[must_use]
    pub fn new(steps_type: StepsType, difficulty: Difficulty) -> Self {
        Self {
            steps_type,
            difficulty,
            meter: 1,
            description: String::new(),
            chart_name: String::new(),
            credit: String::new(),
            step_artist: String::new(),
            radar_values: Vec::new(),
            music: None,
            offset_seconds: None,
            display_bpm: None,
            events: EventLayer::new(),
            owns_timing: false,
            extras: Extras::new(),
        }
    }

    /// Players for this chart, from the steps-type table.
    #[must_use]
    pub fn num_players(&self) -> u8 {
        self.steps_type.num_players()
    }

    /// Input columns for this chart, from the steps-type table.
    #[must_use]
    pub fn num_inputs(&self) -> u8 {
        self.steps_type.num_inputs()
    }

    /// Check structural consistency of the event layer.
    ///
    /// # Errors
    ///
    /// Returns an error when rows or times regress, a lane index is out of
    /// range for the steps type, or hold starts and ends do not pair up.
    pub fn validate(&self) -> SimfileResult<()> {
        let mut prev_row = 0;
        let mut prev_time = 0.0f64;
        let inputs = self.num_inputs();
        // One slot per (player, lane); players address the full input range.
        let mut held: Vec<Option<i32>> =
            vec![None; usize::from(self.num_players()) * usize::from(inputs)];

        for event in &self.events {
            if event.row < prev_row || event.time_seconds < prev_time {
                return Err(SimfileError::MisorderedEvents { row: event.row });
            }
            prev_row = event.row;
            prev_time = event.time_seconds;

            let Some(lane) = event.lane() else { continue };
            let player = event.player().unwrap_or(0);
            if player >= self.num_players() {
                return Err(SimfileError::InvalidNoteData {
                    player,
                    lane,
                    row: event.row,
                    reason: "player outside steps type player count",
                });
            }
            if lane >= inputs {
                return Err(SimfileError::InvalidNoteData {
                    player,
                    lane,
                    row: event.row,
                    reason: "lane outside steps type input range",
                });
            }
            let slot = usize::from(player) * usize::from(inputs) + usize::from(lane);
            match &event.kind {
                EventKind::HoldStart { .. } if held[slot].is_some() => {
                    return Err(SimfileError::InvalidNoteData {
                        player,
                        lane,
                        row: event.row,
                        reason: "hold started during an open hold",
                    });
                }
                EventKind::HoldStart { .. } => held[slot] = Some(event.row),
                EventKind::HoldEnd { .. } if held[slot].is_none() => {
                    return Err(SimfileError::InvalidNoteData {
                        player,
                        lane,
                        row: event.row,
                        reason: "hold end without a matching start",
                    });
                }
                EventKind::HoldEnd { .. } => held[slot] = None,
                _ if held[slot].is_some() => {
                    return Err(SimfileError::InvalidNoteData {
                        player,
                        lane,
                        row: event.row,
                        reason: "step during an open hold",
                    });
                }
                _ => {}
            }
        }

        if let Some((slot, row)) = held
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.map(|row| (i, row)))
        {
            return Err(SimfileError::UnterminatedHold {
                player: (slot / usize::from(inputs)) as u8,
                lane: (slot % usize::from(inputs)) as u8,
                row,
            });
        }
        Ok(())
    }
}
