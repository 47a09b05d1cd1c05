//! Encoder for the per-chart (`.ssc`) format.

use crate::codec::Encoder;
use crate::emit::{
    EmitOptions, PropertyPolicy, format_double, rebuild_attacks, rebuild_combos, rebuild_delays,
    rebuild_fakes, rebuild_labels, rebuild_scrolls, rebuild_speeds, rebuild_stops, rebuild_tempos,
    rebuild_tick_counts, rebuild_time_signatures, rebuild_warps, write_note_grid, write_scalar,
    write_tag, write_timing, write_unknown_tags,
};
use crate::error::SimfileResult;
use crate::model::{Chart, EventLayer, Extras, Song, SourceFormat};

/// Format version written when the source did not carry one.
const DEFAULT_VERSION: &str = "0.83";

/// Encoder for `.ssc` simfiles.
pub struct SscEncoder;

impl Encoder for SscEncoder {
    fn encode_with(song: &Song, options: &EmitOptions) -> SimfileResult<Vec<u8>> {
        let mut out = String::new();
        let same = song.source_format == Some(SourceFormat::Ssc);
        let policy = options.properties;

        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "VERSION",
            Some(song.extras.get_str("VERSION").unwrap_or(DEFAULT_VERSION).to_string()),
        );
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
        write_scalar(&mut out, policy, same, &song.extras, "CDTITLE", Some(song.cd_title.clone()));
        write_scalar(
            &mut out,
            policy,
            same,
            &song.extras,
            "LYRICSPATH",
            Some(song.lyrics_path.clone()),
        );
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

        let timing = song
            .charts
            .iter()
            .find(|c| !c.owns_timing)
            .or_else(|| song.charts.first())
            .map(|c| &c.events);
        write_timing_block(&mut out, policy, same, &song.extras, timing);
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
            write_chart_block(&mut out, policy, same, chart, &grid);
        }

        Ok(out.into_bytes())
    }
}

fn write_timing_block(
    out: &mut String,
    policy: PropertyPolicy,
    same: bool,
    extras: &Extras,
    timing: Option<&EventLayer>,
) {
    let tables = [
        ("BPMS", timing.and_then(rebuild_tempos)),
        ("STOPS", timing.and_then(rebuild_stops)),
        ("DELAYS", timing.and_then(rebuild_delays)),
        ("WARPS", timing.and_then(rebuild_warps)),
        ("TIMESIGNATURES", timing.and_then(rebuild_time_signatures)),
        ("TICKCOUNTS", timing.and_then(rebuild_tick_counts)),
        ("COMBOS", timing.and_then(rebuild_combos)),
        ("SPEEDS", timing.and_then(rebuild_speeds)),
        ("SCROLLS", timing.and_then(rebuild_scrolls)),
        ("FAKES", timing.and_then(rebuild_fakes)),
        ("LABELS", timing.and_then(rebuild_labels)),
    ];
    for (tag, rebuilt) in tables {
        write_timing(out, policy, same, extras, tag, rebuilt);
    }
    if let Some(params) = timing.and_then(rebuild_attacks)
        && (policy == PropertyPolicy::StepmaniaNative || extras.has_raw("ATTACKS"))
    {
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        write_tag(out, "ATTACKS", &params);
    }
}

fn write_chart_block(
    out: &mut String,
    policy: PropertyPolicy,
    same: bool,
    chart: &Chart,
    grid: &str,
) {
    write_tag(out, "NOTEDATA", &[""]);
    write_scalar(out, policy, same, &chart.extras, "CHARTNAME", Some(chart.chart_name.clone()));
    // The structural tags are always written; a block without them does
    // not round-trip.
    write_tag(out, "STEPSTYPE", &[chart.steps_type.as_tag()]);
    write_scalar(
        out,
        policy,
        same,
        &chart.extras,
        "DESCRIPTION",
        Some(chart.description.clone()),
    );
    write_scalar(
        out,
        policy,
        same,
        &chart.extras,
        "CHARTSTYLE",
        chart.extras.get_str("CHARTSTYLE").map(str::to_string),
    );
    write_tag(out, "DIFFICULTY", &[chart.difficulty.as_tag()]);
    write_tag(out, "METER", &[&chart.meter.to_string()]);
    write_scalar(
        out,
        policy,
        same,
        &chart.extras,
        "RADARVALUES",
        Some(radar_string(chart)),
    );
    write_scalar(out, policy, same, &chart.extras, "CREDIT", Some(chart.credit.clone()));
    if let Some(music) = &chart.music {
        write_tag(out, "MUSIC", &[music]);
    }
    if let Some(offset) = chart.offset_seconds {
        write_tag(out, "OFFSET", &[&format_double(offset)]);
    }
    if let Some(params) = &chart.display_bpm {
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        write_tag(out, "DISPLAYBPM", &params);
    }
    if chart.owns_timing {
        write_timing_block(out, policy, same, &chart.extras, Some(&chart.events));
    }
    if policy == PropertyPolicy::MatchSource {
        write_unknown_tags(out, &chart.extras);
    }
    out.push_str("#NOTES:\n");
    out.push_str(grid);
    out.push_str(";\n\n");
}

fn radar_string(chart: &Chart) -> String {
    if let Some(raw) = chart.extras.raw("RADARVALUES") {
        return raw.trim().to_string();
    }
    chart
        .radar_values
        .iter()
        .map(|v| format!("{v:.3}"))
        .collect::<Vec<_>>()
        .join(",")
}
