//! Writer tests: property policies, spacing policies and round trips.

use simfile_exchange::{
    Decoder, EmitOptions, Encoder, EventKind, PropertyPolicy, SmEncoder, SpacingPolicy,
    SscDecoder, SscEncoder,
};

mod common;
use common::{minimal_sm, parse_sm, parse_ssc, tap_then_rest};

fn options(properties: PropertyPolicy, spacing: SpacingPolicy) -> EmitOptions {
    EmitOptions { properties, spacing }
}

/// Parse → emit → parse is structurally stable, and emitting twice is
/// byte-identical.
#[test]
fn match_source_round_trip_is_idempotent() {
    let original = parse_sm(&minimal_sm("#STOPS:4.000=0.500;\n", &tap_then_rest(2)));
    let first = SmEncoder::encode_to_string(&original, &EmitOptions::default()).unwrap();
    let reparsed = parse_sm(&first);
    let second = SmEncoder::encode_to_string(&reparsed, &EmitOptions::default()).unwrap();

    assert_eq!(first, second);
    assert_eq!(original.title, reparsed.title);
    assert_eq!(original.charts.len(), reparsed.charts.len());
    let rows = |song: &simfile_exchange::Song| -> Vec<i32> {
        song.charts[0].events.iter().map(|e| e.row).collect()
    };
    assert_eq!(rows(&original), rows(&reparsed));
}

/// Inputs that differ only in trailing terminators parse to equal models.
#[test]
fn trailing_terminators_do_not_change_the_model() {
    let with_terminators = "#TITLE:T;\n#ARTIST:A;\n#MUSIC:m.ogg;";
    let without = "#TITLE:T\n#ARTIST:A\n#MUSIC:m.ogg";
    assert_eq!(parse_sm(with_terminators), parse_sm(without));
}

#[test]
fn match_source_only_emits_what_the_source_carried() {
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)));
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    assert!(out.contains("#TITLE:T;"));
    assert!(out.contains("#BPMS:0.000=120.000;"));
    assert!(!out.contains("#GENRE"));
    assert!(!out.contains("#BANNER"));
}

#[test]
fn native_policy_emits_the_standard_set() {
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)));
    let out = SmEncoder::encode_to_string(
        &song,
        &options(PropertyPolicy::StepmaniaNative, SpacingPolicy::PreserveSource),
    )
    .unwrap();
    for tag in ["#TITLE:", "#SUBTITLE:", "#GENRE:", "#BANNER:", "#SELECTABLE:", "#BPMS:", "#STOPS:"]
    {
        assert!(out.contains(tag), "missing {tag} in native output");
    }
}

#[test]
fn preserved_raw_strings_survive_verbatim() {
    // An unusually formatted pair the typed re-format would normalize.
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)).replace("0.000=120.000", "0.0=120.0"));
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    assert!(out.contains("#BPMS:0.0=120.0;"));
}

#[test]
fn freezes_alias_round_trips_under_its_own_tag() {
    let song = parse_sm(&minimal_sm("#FREEZES:4.000=0.500;\n", &tap_then_rest(2)));
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    assert!(out.contains("#FREEZES:4.000=0.500;"));
    assert!(!out.contains("#STOPS:"));
}

#[test]
fn unknown_tags_are_echoed_back() {
    let song = parse_sm(&minimal_sm("#BGCHANGES:0.000=bg.avi=1.000;\n", &tap_then_rest(1)));
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    assert!(out.contains("#BGCHANGES:0.000=bg.avi=1.000;"));
}

fn fourteen_line_song() -> simfile_exchange::Song {
    let grid: String = (0..14)
        .map(|i| if i == 0 { "1000\n" } else { "0000\n" })
        .collect();
    parse_sm(&minimal_sm("", grid.trim_end()))
}

#[test]
fn preserve_spacing_reuses_source_line_counts() {
    let song = fourteen_line_song();
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    let grid_lines = out
        .lines()
        .filter(|l| l.len() == 4 && l.chars().all(|c| matches!(c, '0' | '1')))
        .count();
    assert_eq!(grid_lines, 14);
}

#[test]
fn lcm_spacing_refits_the_measure() {
    let song = fourteen_line_song();
    let out = SmEncoder::encode_to_string(
        &song,
        &options(PropertyPolicy::MatchSource, SpacingPolicy::SubdivisionLcm),
    )
    .unwrap();
    // The one tap sits on line 0 of 14; a beat denominator of 1 refits to
    // a plain 4-line measure.
    let grid_lines = out
        .lines()
        .filter(|l| l.len() == 4 && l.chars().all(|c| matches!(c, '0' | '1')))
        .count();
    assert_eq!(grid_lines, 4);
}

#[test]
fn capped_spacing_rejects_unpromotable_charts() {
    let grid: String = (0..14)
        .map(|i| if i == 3 { "1000\n" } else { "0000\n" })
        .collect();
    let song = parse_sm(&minimal_sm("", grid.trim_end()));
    let out = SmEncoder::encode_to_string(
        &song,
        &options(PropertyPolicy::MatchSource, SpacingPolicy::SubdivisionLcmCapped),
    )
    .unwrap();
    assert!(!out.contains("#NOTES"), "chart should have been skipped");
}

#[test]
fn cross_format_emission_rebuilds_timing_from_events() {
    let song = parse_sm(&minimal_sm("#STOPS:4.000=0.500;\n", &tap_then_rest(2)));
    let out = SscEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    assert!(out.contains("#NOTEDATA:;"));
    assert!(out.contains("#STEPSTYPE:dance-single;"));
    assert!(out.contains("#BPMS:0.000000=120.000000;"));
    assert!(out.contains("#STOPS:4.000000=0.500000;"));

    let reparsed = SscDecoder::decode(out.as_bytes()).unwrap();
    assert_eq!(reparsed.charts.len(), 1);
    let kinds = |song: &simfile_exchange::Song| -> Vec<i32> {
        song.charts[0]
            .events
            .iter()
            .filter(|e| e.is_lane_event())
            .map(|e| e.row)
            .collect()
    };
    assert_eq!(kinds(&song), kinds(&reparsed));
}

#[test]
fn ssc_round_trip_keeps_chart_timing_blocks() {
    let text = "#TITLE:T;\n#BPMS:0.000=120.000;\n\
                #NOTEDATA:;\n#STEPSTYPE:dance-single;\n#DIFFICULTY:Hard;\n#METER:9;\n\
                #BPMS:0.000=200.000;\n#NOTES:\n1000\n0000\n0000\n0000\n;\n";
    let song = parse_ssc(text);
    let out = SscEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    let reparsed = parse_ssc(&out);
    assert!(reparsed.charts[0].owns_timing);
    assert!(
        reparsed.charts[0]
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::Tempo { bpm } if bpm == 200.0))
    );
}

#[test]
fn hold_token_variants_survive_a_round_trip() {
    let grid = "2000\n3000\n4000\n3000\n,\nM000\nL000\nF000\nK[7]000";
    let song = parse_sm(&minimal_sm("", grid));
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    for token in ["2000", "3000", "4000", "M000", "L000", "F000", "K[7]000"] {
        assert!(out.contains(token), "missing {token}");
    }
}

#[test]
fn invalid_charts_are_skipped_at_emission() {
    let mut song = parse_sm(&minimal_sm("", &tap_then_rest(1)));
    // Tooling breaks the hold pairing behind the writer's back.
    song.charts[0].events.events.push(simfile_exchange::Event::new(
        96,
        EventKind::HoldEnd { player: 0, lane: 0 },
    ));
    song.charts[0].events.sort();
    let out = SmEncoder::encode_to_string(&song, &EmitOptions::default()).unwrap();
    assert!(!out.contains("#NOTES"));
}
