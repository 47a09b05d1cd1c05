//! Row⇄time resolution.
//!
//! A single forward pass over a canonically sorted event layer assigns
//! each event its chart-time in seconds from the tempos, stops and warps
//! that precede it. Warps do not stack: an overlapping warp only extends
//! the end row of the active one. Stops of either sign accumulate, so
//! negative stops stack, and times are clamped to stay non-decreasing.

use crate::model::{EventKind, EventLayer, ROWS_PER_BEAT, ROWS_PER_MEASURE};

/// Seconds one row occupies at the given tempo.
#[must_use]
pub fn seconds_per_row(bpm: f64) -> f64 {
    60.0 / (bpm * f64::from(ROWS_PER_BEAT))
}

/// Assign `time_seconds` to every event. Events before the first tempo
/// share its start time of zero.
pub fn resolve_times(layer: &mut EventLayer) {
    let mut last_tempo: Option<f64> = None;
    let mut last_tempo_row = 0i32;
    let mut last_tempo_time = 0.0f64;
    let mut total_stop_time = 0.0f64;
    let mut total_warp_time = 0.0f64;
    let mut warp_end_row = -1i32;
    let mut warp_rate_change_row = 0i32;
    let mut previous_time = 0.0f64;

    for event in layer.iter_mut() {
        let spr = last_tempo.map_or(0.0, seconds_per_row);
        let t_raw = if last_tempo.is_some() {
            last_tempo_time + f64::from(event.row - last_tempo_row) * spr
        } else {
            0.0
        };

        let mut warp_active = warp_end_row >= 0;
        let mut current_warp_time = 0.0;
        if warp_active {
            let effective_end = event.row.min(warp_end_row);
            current_warp_time = f64::from(effective_end - warp_rate_change_row) * spr;
            if event.row >= warp_end_row {
                total_warp_time += current_warp_time;
                current_warp_time = 0.0;
                warp_end_row = -1;
                warp_active = false;
            }
        }

        let mut time = t_raw - current_warp_time - total_warp_time + total_stop_time;
        if time < previous_time {
            time = previous_time;
        }
        event.time_seconds = time;
        previous_time = time;

        match &event.kind {
            EventKind::Stop { seconds, .. } => total_stop_time += seconds,
            EventKind::Warp { rows } => {
                if warp_end_row < 0 {
                    warp_rate_change_row = event.row;
                }
                warp_end_row = warp_end_row.max(event.row + rows);
            }
            EventKind::Tempo { bpm } => {
                // A tempo change inside a warp is a rate boundary: bank the
                // warped time so far and restart the segment here.
                if warp_active {
                    total_warp_time += current_warp_time;
                    warp_rate_change_row = event.row;
                }
                last_tempo = Some(*bpm);
                last_tempo_row = event.row;
                last_tempo_time = t_raw;
            }
            EventKind::TimeSignature { .. } => {
                if warp_active {
                    total_warp_time += current_warp_time;
                    warp_rate_change_row = event.row;
                }
            }
            _ => {}
        }
    }
}

/// Assign measure indices from the time-signature sequence. Signatures
/// themselves snap forward to the next measure boundary; other events
/// take the measure they fall inside.
pub fn assign_measures(layer: &mut EventLayer) {
    let mut sig_row = 0i32;
    let mut sig_measure = 0i32;
    let mut rows_per_measure = ROWS_PER_MEASURE;

    for event in layer.iter_mut() {
        if let EventKind::TimeSignature {
            numerator,
            denominator,
        } = event.kind
        {
            let delta = event.row - sig_row;
            let measure = sig_measure + (delta + rows_per_measure - 1) / rows_per_measure;
            event.measure = measure;
            sig_measure = measure;
            sig_row = event.row;
            rows_per_measure = (numerator * ROWS_PER_MEASURE / denominator).max(1);
        } else {
            event.measure = sig_measure + (event.row - sig_row) / rows_per_measure;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Event;

    fn layer(events: Vec<Event>) -> EventLayer {
        let mut layer = EventLayer { events };
        layer.sort();
        layer
    }

    #[test]
    fn tempo_spacing_is_linear() {
        let mut layer = layer(vec![
            Event::new(0, EventKind::Tempo { bpm: 120.0 }),
            Event::new(192, EventKind::Label { text: "m1".into() }),
        ]);
        resolve_times(&mut layer);
        assert!((layer.events[1].time_seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn events_without_any_tempo_sit_at_zero() {
        let mut layer = layer(vec![Event::new(96, EventKind::Label { text: "x".into() })]);
        resolve_times(&mut layer);
        assert_eq!(layer.events[0].time_seconds, 0.0);
    }

    #[test]
    fn measures_follow_signature_lengths() {
        let mut layer = layer(vec![
            Event::new(0, EventKind::TimeSignature { numerator: 4, denominator: 4 }),
            Event::new(192, EventKind::TimeSignature { numerator: 3, denominator: 4 }),
            Event::new(192 + 144, EventKind::Label { text: "x".into() }),
        ]);
        assign_measures(&mut layer);
        assert_eq!(layer.events[0].measure, 0);
        assert_eq!(layer.events[1].measure, 1);
        assert_eq!(layer.events[2].measure, 2);
    }
}
