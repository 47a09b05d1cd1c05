//! Load/save tests: outcomes, cancellation and atomic output.

use simfile_exchange::{
    CancellationToken, EmitOptions, Encoder, LoadOutcome, SmDecoder, SmEncoder, load_song,
    save_song,
};

mod common;
use common::{minimal_sm, parse_sm, tap_then_rest};

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.sm");
    let song = parse_sm(&minimal_sm("", &tap_then_rest(2)));

    assert!(save_song::<SmEncoder>(&song, &path, &EmitOptions::default()));
    let outcome = load_song::<SmDecoder>(&path, &CancellationToken::new());
    let loaded = outcome.song().expect("song loads back");
    assert_eq!(loaded.title, song.title);
    assert_eq!(loaded.charts.len(), 1);
}

#[test]
fn missing_files_fail_without_a_song() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = load_song::<SmDecoder>(dir.path().join("absent.sm"), &CancellationToken::new());
    assert!(matches!(outcome, LoadOutcome::Failed));
    assert!(!outcome.is_cancelled());
}

#[test]
fn cancellation_is_distinct_from_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.sm");
    std::fs::write(&path, minimal_sm("", &tap_then_rest(1))).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let outcome = load_song::<SmDecoder>(&path, &token);
    assert!(outcome.is_cancelled());
    assert!(outcome.song().is_none());
}

#[test]
fn saves_leave_no_temp_file_behind_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.sm");
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)));

    assert!(save_song::<SmEncoder>(&song, &path, &EmitOptions::default()));
    assert!(path.exists());
    assert!(!dir.path().join("song.sm.tmp").exists());
}

#[test]
fn failed_saves_never_touch_the_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("song.sm");
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)));

    assert!(!save_song::<SmEncoder>(&song, &path, &EmitOptions::default()));
    assert!(!path.exists());
}

#[test]
fn saving_over_an_existing_file_replaces_it_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.sm");
    std::fs::write(&path, "stale contents").unwrap();
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)));

    assert!(save_song::<SmEncoder>(&song, &path, &EmitOptions::default()));
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("#TITLE:T;"));
}

#[test]
fn encode_to_path_goes_through_the_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.sm");
    let song = parse_sm(&minimal_sm("", &tap_then_rest(1)));

    SmEncoder::encode_to_path(&song, &path, &EmitOptions::default()).unwrap();
    assert!(path.exists());
    assert!(!dir.path().join("song.sm.tmp").exists());
}
