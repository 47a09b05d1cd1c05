//! Encoder for the song-level (`.sm`) format.

use std::fmt::Write as _;

use crate::codec::Encoder;
use crate::emit::{
    EmitOptions, PropertyPolicy, format_double, rebuild_attacks, rebuild_combos, rebuild_delays,
    rebuild_fakes, rebuild_labels, rebuild_scrolls, rebuild_speeds, rebuild_stops, rebuild_tempos,
    rebuild_tick_counts, rebuild_time_signatures, rebuild_warps, write_note_grid, write_scalar,
    write_tag, write_timing, write_unknown_tags,
};
use crate::error::SimfileResult;
use crate::model::{Chart, EventLayer, Song, SourceFormat};
use crate::msd::escape_param;

/// Encoder for `.sm` simfiles.
pub struct SmEncoder;

impl Encoder for SmEncoder {
    fn encode_with(song: &Song, options: &EmitOptions) -> SimfileResult<Vec<u8>> {
        let mut out = String::new();
        let same = song.source_format == Some(SourceFormat::Sm);
        let policy = options.properties;

        write_scalar(&mut out, policy, same, &song.extras, "TITLE", Some(song.title.clone()));
        write_scalar(&mut out, policy, same, &song.extras, "SUBTITLE", Some(song.subtitle.clone()));
        write_scalar(&mut out, policy, same, &song.extras, "ARTIST", Some(song.artist.clone()));
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "TITLETRANSLIT",
            Some(song.title_translit.clone()),
        );
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "SUBTITLETRANSLIT",
            Some(song.subtitle_translit.clone()),
        );
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "ARTISTTRANSLIT",
            Some(song.artist_translit.clone()),
        );
        write_scalar(&mut out, policy, same, &song.extras, "GENRE", Some(song.genre.clone()));
        write_scalar(&mut out, policy, same, &song.extras, "CREDIT", Some(song.credit.clone()));
        write_scalar(&mut out, policy, same, &song.extras, "BANNER", Some(song.banner.clone()));
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "BACKGROUND",
            Some(song.background.clone()),
        );
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "LYRICSPATH",
            Some(song.lyrics_path.clone()),
        );
        write_scalar(&mut out, policy, same, &song.extras, "CDTITLE", Some(song.cd_title.clone()));
        write_scalar(&mut out, policy, same, &song.extras, "MUSIC", Some(song.music.clone()));
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "OFFSET",
            Some(format_double(song.offset_seconds.unwrap_or(0.0))),
        );
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "SAMPLESTART",
            Some(format_double(song.preview_start.unwrap_or(0.0))),
        );
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "SAMPLELENGTH",
            Some(format_double(song.preview_length.unwrap_or(0.0))),
        );
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "SELECTABLE",
            Some(song.extras.get_str("SELECTABLE").unwrap_or("YES").to_string()),
        );
        if let Some(params) = &song.display_bpm
            && (policy == PropertyPolicy::StepmaniaNative || song.extras.has_raw("DISPLAYBPM"))
        {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            write_tag(&mut out, "DISPLAYBPM", &params);
        }

        let timing = shared_timing_layer(song);
        let tempos = timing.and_then(rebuild_tempos);
        let stops = timing.and_then(rebuild_stops);
        if policy == PropertyPolicy::StepmaniaNative {
            write_timing(&mut out, policy, same, &song.extras, "BPMS", tempos);
            write_timing(&mut out, policy, same, &song.extras, "STOPS", stops);
            // The extended tags only appear when they carry data.
            for (tag, rebuilt) in extended_tables(timing) {
                if let Some(value) = rebuilt {
                    write_tag(&mut out, tag, &[&value]);
                }
            }
        } else {
            write_timing(&mut out, policy, same, &song.extras, "BPMS", tempos);
            write_timing(&mut out, policy, same, &song.extras, "STOPS", stops.clone());
            write_timing(&mut out, policy, same, &song.extras, "FREEZES", stops);
            for (tag, rebuilt) in extended_tables(timing) {
                write_timing(&mut out, policy, same, &song.extras, tag, rebuilt);
            }
        }
        if let Some(params) = timing.and_then(rebuild_attacks)
            && (policy == PropertyPolicy::StepmaniaNative || song.extras.has_raw("ATTACKS"))
        {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            write_tag(&mut out, "ATTACKS", &params);
        }
        if policy == PropertyPolicy::MatchSource {
            write_unknown_tags(&mut out, &song.extras);
        }
        out.push('\n');

        for chart in &song.charts {
            if let Err(error) = chart.validate() {
                tracing::error!(
                    "Skipping {} {} chart: {}",
                    chart.steps_type.as_tag(),
                    chart.difficulty.as_tag(),
                    error
                );
                continue;
            }
            let grid = match write_note_grid(chart, options.spacing) {
                Ok(grid) => grid,
                Err(error) => {
                    tracing::error!(
                        "Skipping {} {} chart: {}",
                        chart.steps_type.as_tag(),
                        chart.difficulty.as_tag(),
                        error
                    );
                    continue;
                }
            };
            out.push_str("#NOTES:\n");
            let _ = writeln!(out, "     {}:", chart.steps_type.as_tag());
            let _ = writeln!(out, "     {}:", escape_param(&chart.description));
            let _ = writeln!(out, "     {}:", chart.difficulty.as_tag());
            let _ = writeln!(out, "     {}:", chart.meter);
            let _ = writeln!(out, "     {}:", radar_string(chart, same));
            out.push_str(&grid);
            out.push_str(";\n\n");
        }

        Ok(out.into_bytes())
    }
}

/// Layer the song-level timing tables serialize from: the first chart
/// still on song timing, or failing that the first chart at all.
fn shared_timing_layer(song: &Song) -> Option<&EventLayer> {
    song.charts
        .iter()
        .find(|c| !c.owns_timing)
        .or_else(|| {
            if song.charts.is_empty() {
                None
            } else {
                tracing::warn!("Every chart owns its timing; song tables follow the first chart");
                song.charts.first()
            }
        })
        .map(|c| &c.events)
}

type Rebuilt = Option<String>;

fn extended_tables(timing: Option<&EventLayer>) -> Vec<(&'static str, Rebuilt)> {
    vec![
        ("DELAYS", timing.and_then(rebuild_delays)),
        ("WARPS", timing.and_then(rebuild_warps)),
        ("TIMESIGNATURES", timing.and_then(rebuild_time_signatures)),
        ("TICKCOUNTS", timing.and_then(rebuild_tick_counts)),
        ("COMBOS", timing.and_then(rebuild_combos)),
        ("SPEEDS", timing.and_then(rebuild_speeds)),
        ("SCROLLS", timing.and_then(rebuild_scrolls)),
        ("FAKES", timing.and_then(rebuild_fakes)),
        ("LABELS", timing.and_then(rebuild_labels)),
    ]
}

fn radar_string(chart: &Chart, same_format: bool) -> String {
    if same_format && let Some(raw) = chart.extras.raw("RADARVALUES") {
        return raw.trim().to_string();
    }
    if chart.radar_values.is_empty() {
        return "0,0,0,0,0".to_string();
    }
    chart
        .radar_values
        .iter()
        .map(|v| format!("{v:.3}"))
        .collect::<Vec<_>>()
        .join(",")
}
