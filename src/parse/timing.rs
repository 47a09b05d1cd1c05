//! Timing assembly.
//!
//! Converts the beat-keyed tables accumulated by the property dispatcher
//! into positioned events: beats snap to integer rows against the
//! permitted subdivision set, invalid entries are dropped with a
//! diagnostic, same-row collisions keep the later-beat entry, and the
//! assembled events merge into the chart's layer in canonical order.

use crate::model::{
    Event, EventKind, EventLayer, ROWS_PER_BEAT, ROWS_PER_MEASURE, SOURCE_BEAT, SOURCE_TIME,
    VALID_SUBDIVISIONS,
};

use super::properties::AttackSpec;
use super::resolve::seconds_per_row;

/// Beat-keyed timing tables for one scope (song or chart).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingTables {
    pub tempos: Vec<(f64, f64)>,
    pub stops: Vec<(f64, f64)>,
    pub delays: Vec<(f64, f64)>,
    pub warps: Vec<(f64, f64)>,
    pub scrolls: Vec<(f64, f64)>,
    pub speeds: Vec<(f64, f64, f64, i32)>,
    pub fakes: Vec<(f64, f64)>,
    pub tick_counts: Vec<(f64, i32)>,
    pub time_signatures: Vec<(f64, i32, i32)>,
    pub combos: Vec<(f64, i32, i32)>,
    pub labels: Vec<(f64, String)>,
    pub attacks: Vec<AttackSpec>,
}

/// Snap a beat double to its integer row.
///
/// The fractional part snaps to the closest representable fraction from
/// the permitted subdivision set. Beats that land on a negative row (or
/// are not finite) return `None`.
#[must_use]
pub fn beat_to_row(beat: f64) -> Option<i32> {
    if !beat.is_finite() || beat.abs() > 1e7 {
        return None;
    }
    let base = beat.floor();
    let frac = beat - base;

    let mut best_num = 0i32;
    let mut best_den = 1i32;
    let mut best_err = f64::INFINITY;
    for den in VALID_SUBDIVISIONS {
        for num in 0..=den {
            let err = (frac - f64::from(num) / f64::from(den)).abs();
            if err < best_err {
                best_err = err;
                best_num = num;
                best_den = den;
            }
        }
    }

    let row = (base as i32) * ROWS_PER_BEAT + best_num * (ROWS_PER_BEAT / best_den);
    (row >= 0).then_some(row)
}

/// Round every entry to a row, dropping negatives and resolving same-row
/// collisions in favor of the later beat.
fn rounded<T: Clone>(entries: &[T], beat_of: impl Fn(&T) -> f64, tag: &str) -> Vec<(i32, T)> {
    let mut out: Vec<(i32, T)> = Vec::new();
    for entry in entries {
        let beat = beat_of(entry);
        let Some(row) = beat_to_row(beat) else {
            tracing::warn!("Dropping {} entry at unusable beat {}", tag, beat);
            continue;
        };
        match out.last_mut() {
            Some(last) if last.0 == row => {
                tracing::warn!(
                    "{} entries collide at row {}; keeping the later beat {}",
                    tag,
                    row,
                    beat
                );
                last.1 = entry.clone();
            }
            _ => out.push((row, entry.clone())),
        }
    }
    out
}

fn timed_event(row: i32, beat: f64, kind: EventKind) -> Event {
    let mut event = Event::new(row, kind);
    event.extras.set_double(SOURCE_BEAT, beat);
    event
}

/// Merge all tables into the layer and restore canonical order. Lane
/// events are expected to be present already; times stay unassigned.
pub fn assemble_events(layer: &mut EventLayer, tables: &TimingTables) {
    add_tempos(layer, &tables.tempos);
    add_stops(layer, &tables.stops);
    add_delays(layer, &tables.delays);
    add_row_lengths(layer, &tables.warps, "WARPS", |rows| EventKind::Warp { rows });
    add_row_lengths(layer, &tables.fakes, "FAKES", |rows| EventKind::FakeSegment { rows });
    add_time_signatures(layer, &tables.time_signatures);

    for (row, (beat, rate)) in rounded(&tables.scrolls, |e| e.0, "SCROLLS") {
        layer.push(timed_event(row, beat, EventKind::ScrollRate { rate }));
    }
    for (row, (beat, rate, length, mode)) in rounded(&tables.speeds, |e| e.0, "SPEEDS") {
        let prefer_seconds = mode == 1;
        let kind = EventKind::ScrollRateInterpolation {
            rate,
            period_rows: if prefer_seconds {
                0
            } else {
                beat_to_row(length.max(0.0)).unwrap_or(0)
            },
            period_seconds: if prefer_seconds { length } else { 0.0 },
            prefer_seconds,
        };
        layer.push(timed_event(row, beat, kind));
    }
    for (row, (beat, ticks)) in rounded(&tables.tick_counts, |e| e.0, "TICKCOUNTS") {
        if ticks < 0 {
            tracing::warn!("Skipping negative tick count {} at beat {}", ticks, beat);
            continue;
        }
        layer.push(timed_event(row, beat, EventKind::TickCount { ticks }));
    }
    for (row, (beat, hit, miss)) in rounded(&tables.combos, |e| e.0, "COMBOS") {
        layer.push(timed_event(row, beat, EventKind::Multipliers { hit, miss }));
    }
    for (row, (beat, text)) in rounded(&tables.labels, |e| e.0, "LABELS") {
        layer.push(timed_event(row, beat, EventKind::Label { text }));
    }

    layer.sort();
}

fn add_tempos(layer: &mut EventLayer, tempos: &[(f64, f64)]) {
    let entries = rounded(tempos, |e| e.0, "BPMS");
    if entries.is_empty() {
        tracing::warn!("No usable tempo; assuming 60 BPM");
        layer.push(timed_event(0, 0.0, EventKind::Tempo { bpm: 60.0 }));
        return;
    }
    let first_positive = entries.iter().map(|(_, e)| e.1).find(|bpm| *bpm > 0.0);
    for (index, (row, (beat, bpm))) in entries.into_iter().enumerate() {
        let bpm = if bpm > 0.0 {
            bpm
        } else if index == 0 {
            let substitute = first_positive.unwrap_or(60.0);
            tracing::warn!(
                "First tempo {} is not positive; substituting {}",
                bpm,
                substitute
            );
            substitute
        } else {
            tracing::warn!("Skipping non-positive tempo {} at beat {}", bpm, beat);
            continue;
        };
        layer.push(timed_event(row, beat, EventKind::Tempo { bpm }));
    }
}

fn add_stops(layer: &mut EventLayer, stops: &[(f64, f64)]) {
    for (row, (beat, seconds)) in rounded(stops, |e| e.0, "STOPS") {
        // Zero-length stops are meaningless; negative ones are a
        // deliberate gimmick and pass through.
        if seconds == 0.0 {
            tracing::warn!("Skipping zero-length stop at beat {}", beat);
            continue;
        }
        layer.push(timed_event(row, beat, EventKind::Stop { seconds, is_delay: false }));
    }
}

fn add_delays(layer: &mut EventLayer, delays: &[(f64, f64)]) {
    for (row, (beat, seconds)) in rounded(delays, |e| e.0, "DELAYS") {
        if seconds < 0.0 {
            tracing::warn!("Skipping negative delay {} at beat {}", seconds, beat);
            continue;
        }
        layer.push(timed_event(row, beat, EventKind::Stop { seconds, is_delay: true }));
    }
}

fn add_row_lengths(
    layer: &mut EventLayer,
    entries: &[(f64, f64)],
    tag: &str,
    make: impl Fn(i32) -> EventKind,
) {
    for (row, (beat, length)) in rounded(entries, |e| e.0, tag) {
        let rows = if length > 0.0 { beat_to_row(length) } else { None };
        match rows {
            Some(rows) if rows > 0 => layer.push(timed_event(row, beat, make(rows))),
            _ => tracing::warn!("Skipping non-positive {} length {} at beat {}", tag, length, beat),
        }
    }
}

fn add_time_signatures(layer: &mut EventLayer, entries: &[(f64, i32, i32)]) {
    let mut valid: Vec<(i32, f64, i32, i32)> = Vec::new();
    for (row, (beat, numerator, denominator)) in rounded(entries, |e| e.0, "TIMESIGNATURES") {
        if numerator < 1 || denominator < 1 || ROWS_PER_MEASURE % denominator != 0 {
            tracing::warn!(
                "Skipping unrepresentable time signature {}/{} at beat {}",
                numerator,
                denominator,
                beat
            );
            continue;
        }
        valid.push((row, beat, numerator, denominator));
    }

    if valid.first().is_none_or(|first| first.0 != 0) {
        tracing::debug!("No time signature at row 0; inserting 4/4");
        valid.insert(0, (0, 0.0, 4, 4));
    }

    let mut prev_row = 0i32;
    let mut prev_rows_per_measure = ROWS_PER_MEASURE;
    for (index, (row, beat, numerator, denominator)) in valid.into_iter().enumerate() {
        if index > 0 && (row - prev_row) % prev_rows_per_measure != 0 {
            tracing::warn!(
                "Skipping time signature {}/{} off a measure boundary at row {}",
                numerator,
                denominator,
                row
            );
            continue;
        }
        layer.push(timed_event(row, beat, EventKind::TimeSignature { numerator, denominator }));
        prev_row = row;
        prev_rows_per_measure = numerator * ROWS_PER_MEASURE / denominator;
    }
}

/// Place attacks after time resolution. Attacks are specified in
/// song-time seconds; each converts to chart time, snaps to the nearest
/// row through the resolved event list, and re-derives its time from the
/// snapped row. Coincident attacks merge into one event.
pub fn place_attacks(layer: &mut EventLayer, attacks: &[AttackSpec], music_offset: f64) {
    if attacks.is_empty() {
        return;
    }
    for spec in attacks {
        let chart_time = spec.start_seconds + music_offset;
        let (row, snapped_time) = snap_time_to_row(layer, chart_time);

        if let Some(existing) = layer
            .iter_mut()
            .find(|e| e.row == row && matches!(e.kind, EventKind::Attack { .. }))
        {
            tracing::warn!("Coincident attacks at row {}; merging modifier lists", row);
            if let EventKind::Attack { mods, .. } = &mut existing.kind {
                mods.extend(spec.mods.iter().cloned());
            }
            continue;
        }

        let mut event = Event::new(
            row,
            EventKind::Attack {
                length_seconds: spec.length_seconds,
                mods: spec.mods.clone(),
            },
        );
        event.time_seconds = snapped_time;
        event.extras.set_double(SOURCE_TIME, spec.start_seconds);
        layer.push(event);
    }
    layer.sort();
}

/// Walk the resolved list for the last event at or before `time` and
/// extrapolate rows at the tempo active there.
fn snap_time_to_row(layer: &EventLayer, time: f64) -> (i32, f64) {
    let mut anchor_row = 0i32;
    let mut anchor_time = 0.0f64;
    let mut bpm = 60.0f64;
    for event in layer.iter() {
        if event.time_seconds > time + 1e-9 {
            break;
        }
        anchor_row = event.row;
        anchor_time = event.time_seconds;
        if let EventKind::Tempo { bpm: tempo } = event.kind {
            bpm = tempo;
        }
    }
    let spr = seconds_per_row(bpm);
    let row = (anchor_row + ((time - anchor_time) / spr).round() as i32).max(0);
    let snapped = (anchor_time + f64::from(row - anchor_row) * spr).max(0.0);
    (row, snapped)
}
