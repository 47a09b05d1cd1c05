//! Chart events and their canonical ordering.
//!
//! Every event carries an integer row (192 rows per 4/4 measure), a
//! chart-time in seconds derived by the timing resolver, and the measure
//! index it falls in. Ties at equal rows are broken by the canonical
//! comparator, which gimmick charts depend on: scroll rates sort before
//! stops, stops before warps, delays before notes, warps after notes.

use std::cmp::Ordering;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::extras::Extras;

/// Rows per quarter-note beat.
pub const ROWS_PER_BEAT: i32 = 48;
/// Beats per measure in the note-grid layout (grids are always 4/4).
pub const BEATS_PER_MEASURE: i32 = 4;
/// Rows per measure.
pub const ROWS_PER_MEASURE: i32 = ROWS_PER_BEAT * BEATS_PER_MEASURE;

/// Beat subdivision denominators the editor can place. A 24th-note
/// subdivision is exact in row arithmetic but has no grid of its own; it
/// promotes to 48ths.
pub const VALID_SUBDIVISIONS: [i32; 9] = [1, 2, 3, 4, 6, 8, 12, 16, 48];

/// Variants of a single-row lane note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapKind {
    Tap,
    Lift,
    Fake,
    KeySound,
    Mine,
}

/// Variants of a sustained lane note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldKind {
    Hold,
    Roll,
}

/// The closed set of chart event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Tempo {
        bpm: f64,
    },
    /// A pause of absolute duration. Delays pause before the notes on
    /// their row, stops after; negative lengths rewind time and stack.
    Stop {
        seconds: f64,
        is_delay: bool,
    },
    /// Instantaneous skip forward. Warps do not stack; overlapping warps
    /// only extend the end row.
    Warp {
        rows: i32,
    },
    TimeSignature {
        numerator: i32,
        denominator: i32,
    },
    ScrollRate {
        rate: f64,
    },
    ScrollRateInterpolation {
        rate: f64,
        period_rows: i32,
        period_seconds: f64,
        prefer_seconds: bool,
    },
    TickCount {
        ticks: i32,
    },
    Label {
        text: String,
    },
    FakeSegment {
        rows: i32,
    },
    Multipliers {
        hit: i32,
        miss: i32,
    },
    Attack {
        length_seconds: f64,
        mods: Vec<String>,
    },
    Tap {
        player: u8,
        lane: u8,
        kind: TapKind,
    },
    HoldStart {
        player: u8,
        lane: u8,
        kind: HoldKind,
    },
    HoldEnd {
        player: u8,
        lane: u8,
    },
}

/// A positioned chart event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 0-based row index; one measure is 192 rows.
    pub row: i32,
    /// Chart-time in seconds, assigned by the resolver.
    pub time_seconds: f64,
    /// Measure index under the active time signatures.
    pub measure: i32,
    /// Raw token the source grid used for this event, when it came from one.
    pub source_token: Option<CompactString>,
    /// Token to prefer when writing a grid, when a caller has set one.
    pub dest_token: Option<CompactString>,
    pub extras: Extras,
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn new(row: i32, kind: EventKind) -> Self {
        Self {
            row,
            time_seconds: 0.0,
            measure: 0,
            source_token: None,
            dest_token: None,
            extras: Extras::new(),
            kind,
        }
    }

    /// Beat coordinate of this event.
    #[must_use]
    pub fn beat(&self) -> f64 {
        f64::from(self.row) / f64::from(ROWS_PER_BEAT)
    }

    /// Lane index for lane events.
    #[must_use]
    pub fn lane(&self) -> Option<u8> {
        match self.kind {
            EventKind::Tap { lane, .. }
            | EventKind::HoldStart { lane, .. }
            | EventKind::HoldEnd { lane, .. } => Some(lane),
            _ => None,
        }
    }

    /// Player index for lane events.
    #[must_use]
    pub fn player(&self) -> Option<u8> {
        match self.kind {
            EventKind::Tap { player, .. }
            | EventKind::HoldStart { player, .. }
            | EventKind::HoldEnd { player, .. } => Some(player),
            _ => None,
        }
    }

    /// True for events produced by the note grid.
    #[must_use]
    pub fn is_lane_event(&self) -> bool {
        self.lane().is_some()
    }

    /// Position of the variant in the same-row type order.
    fn order_bucket(&self) -> u8 {
        match &self.kind {
            EventKind::TimeSignature { .. } => 1,
            EventKind::Tempo { .. } => 2,
            EventKind::TickCount { .. } => 3,
            EventKind::FakeSegment { .. } => 4,
            EventKind::Multipliers { .. } => 5,
            EventKind::Label { .. } => 6,
            EventKind::Attack { .. } => 7,
            EventKind::Stop { seconds, is_delay } => {
                if *seconds < 0.0 {
                    16
                } else if *is_delay {
                    8
                } else {
                    15
                }
            }
            EventKind::Tap { kind, .. } => match kind {
                TapKind::Mine => 12,
                _ => 9,
            },
            EventKind::HoldStart { .. } => 10,
            EventKind::HoldEnd { .. } => 11,
            EventKind::ScrollRate { .. } => 13,
            EventKind::ScrollRateInterpolation { .. } => 14,
            EventKind::Warp { .. } => 17,
        }
    }

    /// Canonical total order: row, then lane when both sides are lane
    /// events, then type bucket, then player.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| match (self.lane(), other.lane()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            })
            .then_with(|| self.order_bucket().cmp(&other.order_bucket()))
            .then_with(|| match (self.player(), other.player()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            })
    }
}

/// An ordered sequence of events under the canonical comparator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLayer {
    pub events: Vec<Event>,
}

impl EventLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Restore canonical order. The sort is stable, so events the
    /// comparator cannot distinguish keep their insertion order.
    pub fn sort(&mut self) {
        self.events.sort_by(Event::canonical_cmp);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Event> {
        self.events.iter_mut()
    }
}

impl<'a> IntoIterator for &'a EventLayer {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
