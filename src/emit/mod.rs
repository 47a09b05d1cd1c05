//! Shared emitter base.
//!
//! Both format writers go through the helpers here: scalar writers that
//! prefer preserved raw strings when the source format matches, timing
//! tables that re-serialize the original strings where possible and fall
//! back to `beat=value` lists with 6-decimal doubles, and the measure
//! grid writer with its selectable spacing policies.

mod grid;

pub(crate) use grid::write_note_grid;

use crate::model::{Event, EventKind, EventLayer, Extras, ROWS_PER_BEAT, SOURCE_BEAT, SOURCE_TIME};
use crate::msd::escape_param;

/// Which properties a writer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyPolicy {
    /// Emit a property only if it existed in the source.
    #[default]
    MatchSource,
    /// Emit the property set the reference application writes, regardless
    /// of source.
    StepmaniaNative,
}

/// How many lines a written measure gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpacingPolicy {
    /// Reuse the source subdivisions preserved at parse time.
    #[default]
    PreserveSource,
    /// Least common multiple of the event subdivisions; may produce line
    /// counts no editor offers (24ths and the like).
    SubdivisionLcm,
    /// The LCM promoted to the next editor-supported denominator; rejects
    /// charts whose subdivisions cannot be promoted.
    SubdivisionLcmCapped,
}

/// Writer configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    pub properties: PropertyPolicy,
    pub spacing: SpacingPolicy,
}

/// Append one `#TAG:...;` value, escaping every parameter.
pub(crate) fn write_tag(out: &mut String, tag: &str, params: &[&str]) {
    out.push('#');
    out.push_str(tag);
    for param in params {
        out.push(':');
        out.push_str(&escape_param(param));
    }
    out.push_str(";\n");
}

/// Write a scalar property. The raw source string wins when the formats
/// match; under `MatchSource` the property is skipped entirely unless the
/// source carried it.
pub(crate) fn write_scalar(
    out: &mut String,
    policy: PropertyPolicy,
    same_format: bool,
    extras: &Extras,
    tag: &str,
    typed: Option<String>,
) {
    if policy == PropertyPolicy::MatchSource && !extras.has_raw(tag) {
        return;
    }
    let raw = if same_format {
        extras.raw(tag).map(str::to_string)
    } else {
        None
    };
    let value = raw.or(typed).unwrap_or_default();
    write_tag(out, tag, &[&value]);
}

/// Write a timing table property: the preserved raw string when usable,
/// the rebuilt list otherwise.
pub(crate) fn write_timing(
    out: &mut String,
    policy: PropertyPolicy,
    same_format: bool,
    extras: &Extras,
    tag: &str,
    rebuilt: Option<String>,
) {
    if policy == PropertyPolicy::MatchSource && !extras.has_raw(tag) {
        return;
    }
    let raw = if same_format {
        extras.raw(tag).map(str::to_string)
    } else {
        None
    };
    let value = raw.or(rebuilt).unwrap_or_default();
    write_tag(out, tag, &[&value]);
}

/// Echo unrecognized source tags verbatim.
pub(crate) fn write_unknown_tags(out: &mut String, extras: &Extras) {
    for (tag, params) in extras.unknown_tags() {
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        write_tag(out, tag, &params);
    }
}

pub(crate) fn format_double(value: f64) -> String {
    format!("{value:.6}")
}

/// Beat a timing event serializes at: the source double when preserved,
/// the row-derived beat otherwise.
fn serialized_beat(event: &Event) -> f64 {
    event
        .extras
        .get_double(SOURCE_BEAT)
        .unwrap_or_else(|| event.beat())
}

fn join_pairs(pairs: Vec<String>) -> Option<String> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join(","))
    }
}

pub(crate) fn rebuild_tempos(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Tempo { bpm } => Some(format!(
                    "{}={}",
                    format_double(serialized_beat(e)),
                    format_double(bpm)
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_stops(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Stop { seconds, is_delay: false } => Some(format!(
                    "{}={}",
                    format_double(serialized_beat(e)),
                    format_double(seconds)
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_delays(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Stop { seconds, is_delay: true } => Some(format!(
                    "{}={}",
                    format_double(serialized_beat(e)),
                    format_double(seconds)
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_warps(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Warp { rows } => Some(format!(
                    "{}={}",
                    format_double(serialized_beat(e)),
                    format_double(f64::from(rows) / f64::from(ROWS_PER_BEAT))
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_fakes(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::FakeSegment { rows } => Some(format!(
                    "{}={}",
                    format_double(serialized_beat(e)),
                    format_double(f64::from(rows) / f64::from(ROWS_PER_BEAT))
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_scrolls(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::ScrollRate { rate } => Some(format!(
                    "{}={}",
                    format_double(serialized_beat(e)),
                    format_double(rate)
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_speeds(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::ScrollRateInterpolation {
                    rate,
                    period_rows,
                    period_seconds,
                    prefer_seconds,
                } => {
                    let length = if *prefer_seconds {
                        *period_seconds
                    } else {
                        f64::from(*period_rows) / f64::from(ROWS_PER_BEAT)
                    };
                    Some(format!(
                        "{}={}={}={}",
                        format_double(serialized_beat(e)),
                        format_double(*rate),
                        format_double(length),
                        i32::from(*prefer_seconds)
                    ))
                }
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_tick_counts(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::TickCount { ticks } => {
                    Some(format!("{}={}", format_double(serialized_beat(e)), ticks))
                }
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_time_signatures(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::TimeSignature { numerator, denominator } => Some(format!(
                    "{}={}={}",
                    format_double(serialized_beat(e)),
                    numerator,
                    denominator
                )),
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_combos(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Multipliers { hit, miss } => {
                    let beat = format_double(serialized_beat(e));
                    Some(if hit == miss {
                        format!("{beat}={hit}")
                    } else {
                        format!("{beat}={hit}={miss}")
                    })
                }
                _ => None,
            })
            .collect(),
    )
}

pub(crate) fn rebuild_labels(layer: &EventLayer) -> Option<String> {
    join_pairs(
        layer
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Label { text } => {
                    Some(format!("{}={}", format_double(serialized_beat(e)), text))
                }
                _ => None,
            })
            .collect(),
    )
}

/// Attacks serialize as a parameter sequence rather than one CSV value.
pub(crate) fn rebuild_attacks(layer: &EventLayer) -> Option<Vec<String>> {
    let mut params = Vec::new();
    for event in layer {
        let EventKind::Attack { length_seconds, mods } = &event.kind else {
            continue;
        };
        let time = event
            .extras
            .get_double(SOURCE_TIME)
            .unwrap_or(event.time_seconds);
        params.push(format!("TIME={}", format_double(time)));
        params.push(format!("LEN={}", format_double(*length_seconds)));
        params.push(format!("MODS={}", mods.join(", ")));
    }
    if params.is_empty() { None } else { Some(params) }
}
