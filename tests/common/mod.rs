//! Common test utilities and helpers.

#![allow(dead_code)]

use simfile_exchange::{Decoder, Event, EventKind, SmDecoder, Song, SscDecoder};

/// Decode `.sm` text, panicking on undecodable input.
pub fn parse_sm(text: &str) -> Song {
    SmDecoder::decode(text.as_bytes()).expect("Failed to decode .sm text")
}

/// Decode `.ssc` text, panicking on undecodable input.
pub fn parse_ssc(text: &str) -> Song {
    SscDecoder::decode(text.as_bytes()).expect("Failed to decode .ssc text")
}

/// A minimal `.sm` file with the given extra song tags and one
/// dance-single Beginner chart around the given grid.
pub fn minimal_sm(extra_tags: &str, grid: &str) -> String {
    format!(
        "#TITLE:T;\n#OFFSET:0.000;\n#BPMS:0.000=120.000;\n{extra_tags}#NOTES:dance-single::Beginner:1:0,0,0,0,0:\n{grid}\n;\n"
    )
}

/// A grid of `measures` empty 4-line measures with a tap in lane 0 of the
/// first line.
pub fn tap_then_rest(measures: usize) -> String {
    let mut grid = String::from("1000\n0000\n0000\n0000");
    for _ in 1..measures {
        grid.push_str("\n,\n0000\n0000\n0000\n0000");
    }
    grid
}

/// Events of the only chart.
pub fn chart_events(song: &Song) -> &[Event] {
    assert_eq!(song.charts.len(), 1, "expected exactly one chart");
    &song.charts[0].events.events
}

/// First event at `row` satisfying the predicate.
pub fn event_at<'a>(
    events: &'a [Event],
    row: i32,
    matches: impl Fn(&EventKind) -> bool,
) -> Option<&'a Event> {
    events.iter().find(|e| e.row == row && matches(&e.kind))
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
