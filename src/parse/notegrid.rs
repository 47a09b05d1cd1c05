//! Measure-grid decoder.
//!
//! Turns the character grid of a `NOTES` value into lane events with
//! integer row positions. Grids are laid out in 4/4 regardless of the
//! declared time signatures: `,` separates measures, `\n` separates the
//! lines of a measure, and a line's index within the measure determines
//! its row. `&` separates per-player grids in the song-level format.

use compact_str::CompactString;

use crate::error::{SimfileError, SimfileResult};
use crate::model::{
    Event, EventKind, Extras, HoldKind, KEYSOUND_INDEX, ROWS_PER_MEASURE, SOURCE_LINE_COUNT,
    SOURCE_LINE_INDEX, TapKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneState {
    Free,
    Held,
    Rolling,
}

/// Decode a measure grid into lane events.
///
/// Rows are `measure * 192 + round(line * 192 / line_count)`; the source
/// line fraction is preserved in each event's extras so a writer can
/// reproduce the original subdivisions.
///
/// # Errors
///
/// Returns an error when the grid steps on a held lane, releases a free
/// lane, or leaves a hold open at the end; callers discard the chart.
pub fn decode_note_grid(grid: &str, num_inputs: u8) -> SimfileResult<Vec<Event>> {
    let mut events = Vec::new();

    for (player_index, segment) in grid.trim().split('&').enumerate() {
        let player = player_index as u8;
        let mut lanes = vec![LaneState::Free; usize::from(num_inputs)];
        let mut open_rows = vec![0i32; usize::from(num_inputs)];

        for (measure, block) in segment
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .enumerate()
        {
            let lines: Vec<&str> = block
                .split('\n')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            let line_count = lines.len();
            for (line_index, line) in lines.iter().enumerate() {
                let row = (measure as i32) * ROWS_PER_MEASURE
                    + ((line_index as f64) * f64::from(ROWS_PER_MEASURE) / (line_count as f64))
                        .round() as i32;
                decode_line(
                    line,
                    row,
                    player,
                    line_index,
                    line_count,
                    &mut lanes,
                    &mut open_rows,
                    &mut events,
                )?;
            }
        }

        if let Some(lane) = lanes.iter().position(|s| *s != LaneState::Free) {
            tracing::error!(
                "Player {} lane {} hold starting at row {} is never released",
                player,
                lane,
                open_rows[lane]
            );
            return Err(SimfileError::UnterminatedHold {
                player,
                lane: lane as u8,
                row: open_rows[lane],
            });
        }
    }

    Ok(events)
}

#[allow(clippy::too_many_arguments)]
fn decode_line(
    line: &str,
    row: i32,
    player: u8,
    line_index: usize,
    line_count: usize,
    lanes: &mut [LaneState],
    open_rows: &mut [i32],
    events: &mut Vec<Event>,
) -> SimfileResult<()> {
    let bytes = line.as_bytes();
    let mut pos = 0;
    let mut lane: u8 = 0;

    while pos < bytes.len() && usize::from(lane) < lanes.len() {
        let ch = bytes[pos];
        pos += 1;
        match ch {
            // Deprecated inline annotations carry no events.
            b'{' => pos = skip_past(bytes, pos, b'}'),
            b'<' => pos = skip_past(bytes, pos, b'>'),
            _ => {
                let mut keysound = None;
                if bytes.get(pos) == Some(&b'[') {
                    let close = skip_past(bytes, pos + 1, b']');
                    let digits_end = close.saturating_sub(1).max(pos + 1);
                    keysound = atoi::atoi::<i64>(&bytes[pos + 1..digits_end]);
                    pos = close;
                }
                if let Some(kind) = note_kind(ch, player, lane) {
                    apply_transition(&kind, row, player, lane, lanes, open_rows)?;
                    let mut extras = Extras::new();
                    extras.set_int(SOURCE_LINE_INDEX, line_index as i64);
                    extras.set_int(SOURCE_LINE_COUNT, line_count as i64);
                    if let Some(index) = keysound {
                        extras.set_int(KEYSOUND_INDEX, index);
                    }
                    let mut event = Event::new(row, kind);
                    event.source_token = Some(CompactString::from(char::from(ch).to_string()));
                    event.extras = extras;
                    events.push(event);
                }
                lane += 1;
            }
        }
    }
    Ok(())
}

/// Position just past the next `close` byte, or end of line.
fn skip_past(bytes: &[u8], from: usize, close: u8) -> usize {
    memchr::memchr(close, &bytes[from..]).map_or(bytes.len(), |i| from + i + 1)
}

/// Map a grid character to its event payload. Unmapped characters
/// produce no event; `0` is explicit emptiness.
fn note_kind(ch: u8, player: u8, lane: u8) -> Option<EventKind> {
    match ch {
        b'1' => Some(EventKind::Tap { player, lane, kind: TapKind::Tap }),
        b'2' => Some(EventKind::HoldStart { player, lane, kind: HoldKind::Hold }),
        b'3' => Some(EventKind::HoldEnd { player, lane }),
        b'4' => Some(EventKind::HoldStart { player, lane, kind: HoldKind::Roll }),
        b'M' => Some(EventKind::Tap { player, lane, kind: TapKind::Mine }),
        b'L' => Some(EventKind::Tap { player, lane, kind: TapKind::Lift }),
        b'F' => Some(EventKind::Tap { player, lane, kind: TapKind::Fake }),
        b'K' => Some(EventKind::Tap { player, lane, kind: TapKind::KeySound }),
        _ => None,
    }
}

fn apply_transition(
    kind: &EventKind,
    row: i32,
    player: u8,
    lane: u8,
    lanes: &mut [LaneState],
    open_rows: &mut [i32],
) -> SimfileResult<()> {
    let slot = usize::from(lane);
    let state = lanes[slot];
    match kind {
        EventKind::HoldEnd { .. } => {
            if state == LaneState::Free {
                tracing::error!(
                    "Player {} lane {} row {}: hold end without a matching start",
                    player,
                    lane,
                    row
                );
                return Err(SimfileError::InvalidNoteData {
                    player,
                    lane,
                    row,
                    reason: "hold end without a matching start",
                });
            }
            lanes[slot] = LaneState::Free;
        }
        EventKind::HoldStart { kind: hold_kind, .. } => {
            if state != LaneState::Free {
                tracing::error!(
                    "Player {} lane {} row {}: hold started during an open hold",
                    player,
                    lane,
                    row
                );
                return Err(SimfileError::InvalidNoteData {
                    player,
                    lane,
                    row,
                    reason: "hold started during an open hold",
                });
            }
            lanes[slot] = match hold_kind {
                HoldKind::Hold => LaneState::Held,
                HoldKind::Roll => LaneState::Rolling,
            };
            open_rows[slot] = row;
        }
        _ => {
            if state != LaneState::Free {
                tracing::error!(
                    "Player {} lane {} row {}: step during an open hold",
                    player,
                    lane,
                    row
                );
                return Err(SimfileError::InvalidNoteData {
                    player,
                    lane,
                    row,
                    reason: "step during an open hold",
                });
            }
        }
    }
    Ok(())
}
