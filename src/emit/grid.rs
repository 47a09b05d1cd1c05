//! Measure-grid writer.
//!
//! Rebuilds the character grid of a chart from its lane events. Line
//! counts per measure come from the configured spacing policy; cells are
//! the events' tokens plus any keysound suffix.

use std::collections::BTreeMap;

use crate::error::{SimfileError, SimfileResult};
use crate::model::{
    Chart, Event, EventKind, HoldKind, KEYSOUND_INDEX, ROWS_PER_BEAT, ROWS_PER_MEASURE,
    SOURCE_LINE_COUNT, SOURCE_LINE_INDEX, TapKind, VALID_SUBDIVISIONS,
};

use super::SpacingPolicy;

/// Render the full grid for a chart, players separated by `&`.
///
/// # Errors
///
/// Under the capped policy, returns an error when a measure's
/// subdivisions cannot be promoted to an editor-supported line count;
/// callers skip the chart.
pub(crate) fn write_note_grid(chart: &Chart, spacing: SpacingPolicy) -> SimfileResult<String> {
    let players = usize::from(chart.num_players());
    let width = usize::from(chart.num_inputs());

    // measure -> events, one map per player
    let mut by_player: Vec<BTreeMap<usize, Vec<&Event>>> = vec![BTreeMap::new(); players];
    let mut measure_count = 1usize;
    for event in &chart.events {
        if !event.is_lane_event() {
            continue;
        }
        let player = usize::from(event.player().unwrap_or(0)).min(players - 1);
        let measure = (event.row / ROWS_PER_MEASURE) as usize;
        measure_count = measure_count.max(measure + 1);
        by_player[player].entry(measure).or_default().push(event);
    }

    let mut out = String::new();
    for (player, measures) in by_player.iter().enumerate() {
        if player > 0 {
            out.push_str("&\n");
        }
        for measure in 0..measure_count {
            if measure > 0 {
                out.push_str(",\n");
            }
            let events = measures.get(&measure).map_or(&[][..], Vec::as_slice);
            write_measure(&mut out, events, measure, width, spacing)?;
        }
    }
    Ok(out)
}

fn write_measure(
    out: &mut String,
    events: &[&Event],
    measure: usize,
    width: usize,
    spacing: SpacingPolicy,
) -> SimfileResult<()> {
    let lines = line_count(events, measure, spacing)?;
    let mut cells: Vec<Vec<String>> = vec![vec!["0".to_string(); width]; lines];

    for event in events {
        let Some(token) = grid_token(event) else {
            continue;
        };
        let line = line_of(event, measure, lines);
        let lane = usize::from(event.lane().unwrap_or(0));
        if line >= lines || lane >= width {
            tracing::warn!(
                "Event at row {} does not fit a {}-line measure; dropping",
                event.row,
                lines
            );
            continue;
        }
        if cells[line][lane] != "0" {
            tracing::warn!(
                "Two events share measure {} line {} lane {}; keeping the later",
                measure,
                line,
                lane
            );
        }
        cells[line][lane] = token;
    }

    for row_cells in cells {
        for cell in row_cells {
            out.push_str(&cell);
        }
        out.push('\n');
    }
    Ok(())
}

/// Line count for one measure under the spacing policy.
fn line_count(
    events: &[&Event],
    measure: usize,
    spacing: SpacingPolicy,
) -> SimfileResult<usize> {
    if events.is_empty() {
        return Ok(4);
    }

    if spacing == SpacingPolicy::PreserveSource {
        // All events of a source measure share one line count; reuse it
        // when that holds, otherwise fall through to the LCM.
        let counts: Vec<Option<i64>> = events
            .iter()
            .map(|e| e.extras.get_int(SOURCE_LINE_COUNT))
            .collect();
        if let Some(Some(first)) = counts.first()
            && *first > 0
            && counts.iter().all(|c| *c == Some(*first))
        {
            return Ok(*first as usize);
        }
        tracing::warn!(
            "Measure {} has no uniform source subdivision; falling back to the LCM",
            measure
        );
    }

    let mut lcm_den = 1i32;
    for event in events {
        lcm_den = lcm(lcm_den, beat_denominator(event, measure));
    }

    match spacing {
        SpacingPolicy::SubdivisionLcmCapped => {
            let promoted = VALID_SUBDIVISIONS
                .iter()
                .find(|d| *d % lcm_den == 0)
                .copied()
                .ok_or(SimfileError::UnsupportedSubdivision { measure })?;
            Ok((4 * promoted) as usize)
        }
        _ => Ok((4 * lcm_den) as usize),
    }
}

/// Reduced beat-subdivision denominator of one event, from the preserved
/// source fraction when present, from the row otherwise.
fn beat_denominator(event: &Event, measure: usize) -> i32 {
    if let Some(index) = event.extras.get_int(SOURCE_LINE_INDEX)
        && let Some(count) = event.extras.get_int(SOURCE_LINE_COUNT)
        && count > 0
    {
        // Position in beats is 4*index/count; take its reduced denominator.
        let numerator = (4 * index).rem_euclid(count);
        if numerator == 0 {
            return 1;
        }
        return (count / gcd(numerator, count)) as i32;
    }
    let row_in_measure = event.row - (measure as i32) * ROWS_PER_MEASURE;
    let remainder = row_in_measure.rem_euclid(ROWS_PER_BEAT);
    if remainder == 0 {
        1
    } else {
        ROWS_PER_BEAT / gcd(i64::from(remainder), i64::from(ROWS_PER_BEAT)) as i32
    }
}

/// Line index of an event within a measure of `lines` lines.
fn line_of(event: &Event, measure: usize, lines: usize) -> usize {
    if let Some(index) = event.extras.get_int(SOURCE_LINE_INDEX)
        && let Some(count) = event.extras.get_int(SOURCE_LINE_COUNT)
        && count > 0
        && (index * lines as i64) % count == 0
    {
        return ((index * lines as i64) / count) as usize;
    }
    let row_in_measure = i64::from(event.row - (measure as i32) * ROWS_PER_MEASURE);
    ((row_in_measure * lines as i64 + i64::from(ROWS_PER_MEASURE) / 2)
        / i64::from(ROWS_PER_MEASURE)) as usize
}

/// Grid cell for a lane event: an explicit destination token when set,
/// the character table otherwise, plus any keysound suffix.
fn grid_token(event: &Event) -> Option<String> {
    if let Some(token) = &event.dest_token {
        return Some(token.to_string());
    }
    let ch = match &event.kind {
        EventKind::Tap { kind, .. } => match kind {
            TapKind::Tap => '1',
            TapKind::Mine => 'M',
            TapKind::Lift => 'L',
            TapKind::Fake => 'F',
            TapKind::KeySound => 'K',
        },
        EventKind::HoldStart { kind: HoldKind::Hold, .. } => '2',
        EventKind::HoldStart { kind: HoldKind::Roll, .. } => '4',
        EventKind::HoldEnd { .. } => '3',
        _ => return None,
    };
    let mut token = ch.to_string();
    if let Some(index) = event.extras.get_int(KEYSOUND_INDEX) {
        token.push('[');
        token.push_str(&index.to_string());
        token.push(']');
    }
    Some(token)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

fn lcm(a: i32, b: i32) -> i32 {
    a / gcd(i64::from(a), i64::from(b)) as i32 * b
}
