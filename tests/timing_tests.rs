//! Timing engine tests: stops, delays, warps, signatures and attacks.

use simfile_exchange::EventKind;

mod common;
use common::{approx, chart_events, event_at, minimal_sm, parse_sm, parse_ssc};

const TWO_MEASURES: &str = "1000\n0000\n0000\n0000\n,\n1000\n0100\n0000\n0000";

/// One measure at 120 BPM is two seconds; a two-second stop at row 0
/// pushes the next measure to four.
#[test]
fn stops_pause_after_the_notes_on_their_row() {
    let song = parse_sm(&minimal_sm("#STOPS:0.000=2.000;\n", TWO_MEASURES));
    let events = chart_events(&song);

    let stop = event_at(events, 0, |k| matches!(k, EventKind::Stop { .. })).expect("stop");
    assert_eq!(stop.time_seconds, 0.0);
    let tap_row0 = event_at(events, 0, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert_eq!(tap_row0.time_seconds, 0.0);
    // The stop sorts after the tap it shares a row with.
    let tap_index = events.iter().position(|e| std::ptr::eq(e, tap_row0)).unwrap();
    let stop_index = events.iter().position(|e| std::ptr::eq(e, stop)).unwrap();
    assert!(stop_index > tap_index);

    let tap_row192 = event_at(events, 192, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap_row192.time_seconds, 4.0));
}

/// Delays pause before the notes on their row.
#[test]
fn delays_pause_before_the_notes_on_their_row() {
    let song = parse_sm(&minimal_sm("#DELAYS:4.000=1.000;\n", TWO_MEASURES));
    let events = chart_events(&song);

    let delay =
        event_at(events, 192, |k| matches!(k, EventKind::Stop { is_delay: true, .. }))
            .expect("delay");
    assert!(approx(delay.time_seconds, 2.0));
    let tap = event_at(events, 192, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap.time_seconds, 3.0));
}

/// Every event inside a four-beat warp shares the warp's start time.
#[test]
fn warps_zero_out_their_span() {
    let song = parse_sm(&minimal_sm("#WARPS:0.000=4.000;\n", TWO_MEASURES));
    let events = chart_events(&song);

    let tap_at_warp_end =
        event_at(events, 192, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert_eq!(tap_at_warp_end.time_seconds, 0.0);
    // Row 240 is one beat past the warp: 0.5 seconds at 120 BPM.
    let tap_after = event_at(events, 240, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap_after.time_seconds, 0.5));
}

/// Overlapping warps extend the end row instead of stacking.
#[test]
fn warps_do_not_stack() {
    let grid = "1000\n0000\n0000\n0000\n,\n0000\n0000\n1000\n0100";
    let song = parse_sm(&minimal_sm("#WARPS:0.000=4.000,2.000=4.000;\n", grid));
    let events = chart_events(&song);

    // Rows 288 and 336: the merged warp covers up to row 96 + 192 = 288.
    let tap_at_end = event_at(events, 288, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert_eq!(tap_at_end.time_seconds, 0.0);
    let tap_after = event_at(events, 336, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap_after.time_seconds, 0.5));
}

/// A negative stop longer than the following interval clamps times to the
/// previous event's time.
#[test]
fn negative_stops_clamp_to_the_previous_time() {
    let song = parse_sm(&minimal_sm("#STOPS:4.000=-10.000;\n", TWO_MEASURES)
        .replace("0.000=120.000", "0.000=60.000"));
    let events = chart_events(&song);

    let tap_before = event_at(events, 192, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap_before.time_seconds, 4.0));
    let tap_after = event_at(events, 240, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap_after.time_seconds, 4.0));
}

/// Negative stops stack with each other.
#[test]
fn negative_stops_stack() {
    let grid = "1000\n0000\n0000\n0000\n,\n1000\n0000\n0000\n0000\n,\n1000\n0000\n0000\n0000";
    let song = parse_sm(
        &minimal_sm("#STOPS:0.000=-0.500,4.000=-0.500;\n", grid)
            .replace("0.000=120.000", "0.000=60.000"),
    );
    let events = chart_events(&song);
    // Raw time at row 384 is 8s; two stacked negative stops remove one.
    let tap = event_at(events, 384, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap.time_seconds, 7.0));
}

#[test]
fn measures_track_time_signature_changes() {
    let song = parse_sm(&minimal_sm(
        "#TIMESIGNATURES:0.000=4=4,4.000=3=4;\n",
        "1000\n0000\n0000\n0000\n,\n1000\n0000\n0000\n0100",
    ));
    let events = chart_events(&song);

    let sig = event_at(events, 192, |k| matches!(k, EventKind::TimeSignature { .. }))
        .expect("signature");
    assert_eq!(sig.measure, 1);
    // Row 336 is one 3/4 measure (144 rows) past the change.
    let tap = event_at(events, 336, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert_eq!(tap.measure, 2);
}

#[test]
fn first_non_positive_tempo_takes_the_next_positive_value() {
    let song = parse_sm(
        &minimal_sm("", TWO_MEASURES).replace("0.000=120.000", "0.000=0.000,4.000=150.000"),
    );
    let events = chart_events(&song);
    let first = event_at(events, 0, |k| matches!(k, EventKind::Tempo { .. })).expect("tempo");
    assert!(matches!(first.kind, EventKind::Tempo { bpm } if bpm == 150.0));
}

#[test]
fn songs_without_tempos_assume_sixty() {
    let song = parse_sm("#TITLE:T;#NOTES:dance-single::Hard:5:0:\n0000\n1000\n0000\n0000\n;");
    let events = chart_events(&song);
    let tempo = event_at(events, 0, |k| matches!(k, EventKind::Tempo { .. })).expect("tempo");
    assert!(matches!(tempo.kind, EventKind::Tempo { bpm } if bpm == 60.0));
    // One beat at 60 BPM is one second.
    let tap = event_at(events, 48, |k| matches!(k, EventKind::Tap { .. })).expect("tap");
    assert!(approx(tap.time_seconds, 1.0));
}

#[test]
fn colliding_tempo_beats_keep_the_later_entry() {
    let song = parse_sm(
        &minimal_sm("", TWO_MEASURES).replace("0.000=120.000", "0.000=120.000,0.001=140.000"),
    );
    let events = chart_events(&song);
    let tempos: Vec<&simfile_exchange::Event> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Tempo { .. }))
        .collect();
    assert_eq!(tempos.len(), 1);
    assert!(matches!(tempos[0].kind, EventKind::Tempo { bpm } if bpm == 140.0));
}

/// Rows and times never regress along the layer (stops may repeat a
/// time, warps may repeat nothing but rows stay sorted).
#[test]
fn rows_and_times_are_monotone() {
    let song = parse_sm(&minimal_sm(
        "#STOPS:2.000=1.000,6.000=-3.000;\n#WARPS:1.000=1.000;\n#DELAYS:4.000=0.250;\n",
        TWO_MEASURES,
    ));
    let events = chart_events(&song);
    for pair in events.windows(2) {
        assert!(pair[0].row <= pair[1].row);
        assert!(pair[0].time_seconds <= pair[1].time_seconds + 1e-12);
        assert!(pair[0].time_seconds >= 0.0);
    }
}

#[test]
fn full_timing_tag_set_round_trips_into_events() {
    let song = parse_ssc(
        "#TITLE:T;\n#OFFSET:0.000;\n#BPMS:0.000=120.000;\n#STOPS:8.000=0.500;\n\
         #DELAYS:4.000=0.250;\n#WARPS:12.000=1.000;\n#TIMESIGNATURES:0.000=4=4;\n\
         #TICKCOUNTS:0.000=4;\n#COMBOS:0.000=2;\n#SPEEDS:0.000=1.500=2.000=0;\n\
         #SCROLLS:0.000=1.000,4.000=0.500;\n#FAKES:8.000=1.000;\n#LABELS:0.000=intro;\n\
         #NOTEDATA:;\n#STEPSTYPE:dance-single;\n#DIFFICULTY:Hard;\n#METER:9;\n\
         #NOTES:\n1000\n0000\n0000\n0000\n;\n",
    );
    let events = chart_events(&song);
    assert!(event_at(events, 0, |k| matches!(k, EventKind::TickCount { ticks: 4 })).is_some());
    assert!(
        event_at(events, 0, |k| matches!(k, EventKind::Multipliers { hit: 2, miss: 2 }))
            .is_some()
    );
    assert!(event_at(
        events,
        0,
        |k| matches!(k, EventKind::ScrollRateInterpolation { prefer_seconds: false, .. })
    )
    .is_some());
    assert!(event_at(events, 192, |k| matches!(k, EventKind::ScrollRate { rate } if *rate == 0.5))
        .is_some());
    assert!(
        event_at(events, 384, |k| matches!(k, EventKind::FakeSegment { rows: 48 })).is_some()
    );
    assert!(event_at(events, 0, |k| matches!(k, EventKind::Label { .. })).is_some());
    assert!(
        event_at(events, 576, |k| matches!(k, EventKind::Warp { rows: 48 })).is_some()
    );
}

/// Attacks are placed in chart time and merge when they land on one row.
#[test]
fn attacks_snap_to_rows_and_merge() {
    let song = parse_sm(&minimal_sm(
        "#ATTACKS:TIME=2.000:LEN=1.000:MODS=drunk:TIME=2.001:LEN=0.500:MODS=dizzy;\n",
        TWO_MEASURES,
    ));
    let events = chart_events(&song);
    let attacks: Vec<&simfile_exchange::Event> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Attack { .. }))
        .collect();
    assert_eq!(attacks.len(), 1);
    // Two seconds at 120 BPM is exactly one measure.
    assert_eq!(attacks[0].row, 192);
    assert!(approx(attacks[0].time_seconds, 2.0));
    let EventKind::Attack { mods, .. } = &attacks[0].kind else {
        panic!("not an attack");
    };
    assert_eq!(mods.as_slice(), ["drunk", "dizzy"]);
}

/// The chart offset shifts attack placement from song time to chart time.
#[test]
fn attacks_honor_the_music_offset() {
    let song = parse_sm(
        &minimal_sm("#ATTACKS:TIME=1.000:LEN=0.500:MODS=drunk;\n", TWO_MEASURES)
            .replace("#OFFSET:0.000;", "#OFFSET:1.000;"),
    );
    let events = chart_events(&song);
    let attack = events
        .iter()
        .find(|e| matches!(e.kind, EventKind::Attack { .. }))
        .expect("attack");
    // Chart time 2.0 at 120 BPM is one measure in.
    assert_eq!(attack.row, 192);
}
