//! Property dispatch and the parse pipeline.
//!
//! Tags route by uppercase name to typed handlers. The song scope is
//! active by default; the per-chart format opens a chart scope at each
//! `NOTEDATA` value that lasts until the next one or end of stream.
//! Unknown tags drop into the active scope's extras verbatim. Handlers
//! never abort the parse: malformed values log and continue.

mod notegrid;
mod properties;
mod resolve;
mod timing;

pub use notegrid::decode_note_grid;
pub use properties::AttackSpec;
pub use resolve::{assign_measures, resolve_times, seconds_per_row};
pub use timing::{TimingTables, assemble_events, beat_to_row, place_attacks};

use crate::model::{Chart, Difficulty, Extras, Song, SourceFormat, StepsType};
use crate::msd::{self, MsdValue};

use properties::{
    parse_attacks, parse_beat_int_pairs, parse_beat_value_pairs, parse_combo_counts, parse_labels,
    parse_speed_segments, parse_time_signatures,
};

/// Parse a simfile text buffer into a song.
///
/// Parsing is total: any input yields a song, possibly with zero charts.
/// Charts that fail structurally (unknown steps type, inconsistent hold
/// state) are discarded with a diagnostic and the rest of the file is
/// still honored.
#[must_use]
pub fn parse_song(text: &str, format: SourceFormat) -> Song {
    let mut song = Song::new();
    song.source_format = Some(format);
    let mut song_tables = TimingTables::default();
    let mut builders: Vec<ChartBuilder> = Vec::new();
    let mut open: Option<ChartBuilder> = None;

    for value in msd::tokenize(text) {
        let tag = value.tag().trim().to_ascii_uppercase();
        if tag == "NOTEDATA" {
            if let Some(done) = open.take() {
                builders.push(done);
            }
            open = Some(ChartBuilder::default());
            continue;
        }
        match open.as_mut() {
            Some(builder) => dispatch_chart_tag(builder, &tag, &value),
            None => dispatch_song_tag(&mut song, &mut song_tables, &tag, &value, &mut builders),
        }
    }
    if let Some(done) = open.take() {
        builders.push(done);
    }

    let song_offset = song.offset_seconds;
    for builder in builders {
        if let Some(chart) = builder.finish(&song_tables, song_offset) {
            song.charts.push(chart);
        }
    }
    song
}

/// A chart under construction; resolved into a [`Chart`] once the whole
/// stream has been read.
#[derive(Debug, Default)]
struct ChartBuilder {
    steps_type_tag: String,
    steps_type: Option<StepsType>,
    difficulty: Option<Difficulty>,
    meter: Option<i32>,
    description: String,
    chart_name: String,
    credit: String,
    step_artist: String,
    radar_values: Vec<f64>,
    music: Option<String>,
    offset: Option<f64>,
    display_bpm: Option<Vec<String>>,
    grid: Option<String>,
    tables: TimingTables,
    owns_timing: bool,
    extras: Extras,
}

impl ChartBuilder {
    fn finish(self, song_tables: &TimingTables, song_offset: Option<f64>) -> Option<Chart> {
        let Some(steps_type) = self.steps_type else {
            tracing::error!(
                "Unknown steps type '{}'; discarding chart",
                self.steps_type_tag
            );
            return None;
        };
        let difficulty = self.difficulty.unwrap_or_else(|| {
            tracing::warn!("Chart has no recognizable difficulty; defaulting to Edit");
            Difficulty::Edit
        });

        let mut chart = Chart::new(steps_type, difficulty);
        chart.meter = self.meter.unwrap_or(1);
        chart.description = self.description;
        chart.chart_name = self.chart_name;
        chart.credit = self.credit;
        chart.step_artist = self.step_artist;
        chart.radar_values = self.radar_values;
        chart.music = self.music;
        chart.offset_seconds = self.offset;
        chart.display_bpm = self.display_bpm;
        chart.owns_timing = self.owns_timing;
        chart.extras = self.extras;

        let grid = self.grid.unwrap_or_default();
        match decode_note_grid(&grid, chart.num_inputs()) {
            Ok(events) => chart.events.events = events,
            Err(error) => {
                tracing::error!(
                    "Discarding {} {} chart: {}",
                    steps_type.as_tag(),
                    difficulty.as_tag(),
                    error
                );
                return None;
            }
        }

        let tables = if chart.owns_timing {
            &self.tables
        } else {
            song_tables
        };
        assemble_events(&mut chart.events, tables);
        resolve_times(&mut chart.events);

        let attacks = if self.tables.attacks.is_empty() {
            &song_tables.attacks
        } else {
            &self.tables.attacks
        };
        let offset = chart.offset_seconds.or(song_offset).unwrap_or(0.0);
        place_attacks(&mut chart.events, attacks, offset);
        assign_measures(&mut chart.events);

        Some(chart)
    }
}

fn dispatch_song_tag(
    song: &mut Song,
    tables: &mut TimingTables,
    tag: &str,
    value: &MsdValue,
    builders: &mut Vec<ChartBuilder>,
) {
    match tag {
        "TITLE" => scalar_string(&mut song.title, tag, value, &mut song.extras),
        "SUBTITLE" => scalar_string(&mut song.subtitle, tag, value, &mut song.extras),
        "ARTIST" => scalar_string(&mut song.artist, tag, value, &mut song.extras),
        "TITLETRANSLIT" => scalar_string(&mut song.title_translit, tag, value, &mut song.extras),
        "SUBTITLETRANSLIT" => {
            scalar_string(&mut song.subtitle_translit, tag, value, &mut song.extras);
        }
        "ARTISTTRANSLIT" => scalar_string(&mut song.artist_translit, tag, value, &mut song.extras),
        "GENRE" => scalar_string(&mut song.genre, tag, value, &mut song.extras),
        "CREDIT" => scalar_string(&mut song.credit, tag, value, &mut song.extras),
        "BANNER" => scalar_string(&mut song.banner, tag, value, &mut song.extras),
        "BACKGROUND" => scalar_string(&mut song.background, tag, value, &mut song.extras),
        "CDTITLE" => scalar_string(&mut song.cd_title, tag, value, &mut song.extras),
        "LYRICSPATH" => scalar_string(&mut song.lyrics_path, tag, value, &mut song.extras),
        "MUSIC" => scalar_string(&mut song.music, tag, value, &mut song.extras),
        "OFFSET" => scalar_f64(&mut song.offset_seconds, tag, value, &mut song.extras),
        "SAMPLESTART" => scalar_f64(&mut song.preview_start, tag, value, &mut song.extras),
        "SAMPLELENGTH" => scalar_f64(&mut song.preview_length, tag, value, &mut song.extras),
        "SELECTABLE" | "VERSION" | "ORIGIN" => scalar_extras_only(tag, value, &mut song.extras),
        "DISPLAYBPM" => {
            let params = param_list(value);
            song.extras.set_raw(tag, params.join(":"));
            song.display_bpm = Some(params);
        }
        "NOTES" | "NOTES2" if value.params.len() >= 7 => {
            builders.push(ChartBuilder::from_song_notes(value));
        }
        "NOTES" | "NOTES2" => {
            tracing::warn!("{} value has too few parameters; ignoring", tag);
        }
        _ => {
            if !dispatch_timing_tag(tables, tag, value, &mut song.extras) {
                song.extras.push_unknown(tag, param_list(value));
            }
        }
    }
}

fn dispatch_chart_tag(builder: &mut ChartBuilder, tag: &str, value: &MsdValue) {
    match tag {
        "STEPSTYPE" => {
            let raw = value.param(1).unwrap_or("");
            builder.extras.set_raw(tag, raw);
            builder.steps_type_tag = raw.trim().to_string();
            builder.steps_type = StepsType::from_tag(raw);
        }
        "DIFFICULTY" => {
            let raw = value.param(1).unwrap_or("");
            builder.extras.set_raw(tag, raw);
            builder.difficulty = Difficulty::from_tag(raw);
            if builder.difficulty.is_none() {
                tracing::warn!("Unknown difficulty '{}'", raw.trim());
            }
        }
        "METER" => {
            let raw = value.param(1).unwrap_or("");
            builder.extras.set_raw(tag, raw);
            match raw.trim().parse::<i32>() {
                Ok(meter) => builder.meter = Some(meter),
                Err(_) => tracing::warn!("Failed to parse meter: '{}', defaulting to 1", raw),
            }
        }
        "DESCRIPTION" => scalar_string(&mut builder.description, tag, value, &mut builder.extras),
        "CHARTNAME" => scalar_string(&mut builder.chart_name, tag, value, &mut builder.extras),
        "CREDIT" => scalar_string(&mut builder.credit, tag, value, &mut builder.extras),
        "AUTHOR" => scalar_string(&mut builder.step_artist, tag, value, &mut builder.extras),
        "CHARTSTYLE" => scalar_extras_only(tag, value, &mut builder.extras),
        "RADARVALUES" => {
            let raw = value.param(1).unwrap_or("");
            builder.extras.set_raw(tag, raw);
            builder.radar_values = parse_radar_values(raw);
        }
        "MUSIC" => {
            let raw = value.param(1).unwrap_or("");
            builder.extras.set_raw(tag, raw);
            builder.music = Some(raw.trim().to_string());
        }
        "OFFSET" => {
            builder.owns_timing = true;
            scalar_f64(&mut builder.offset, tag, value, &mut builder.extras);
        }
        "DISPLAYBPM" => {
            let params = param_list(value);
            builder.extras.set_raw(tag, params.join(":"));
            builder.display_bpm = Some(params);
        }
        "NOTES" | "NOTES2" => {
            builder.grid = Some(value.param(1).unwrap_or("").to_string());
        }
        _ => {
            let owns = dispatch_timing_tag(&mut builder.tables, tag, value, &mut builder.extras);
            if owns {
                // Attacks ride along without claiming the timing tables.
                if tag != "ATTACKS" {
                    builder.owns_timing = true;
                }
            } else {
                builder.extras.push_unknown(tag, param_list(value));
            }
        }
    }
}

/// Route one of the beat-keyed timing tags into `tables`. Returns false
/// when the tag is not a timing tag.
fn dispatch_timing_tag(
    tables: &mut TimingTables,
    tag: &str,
    value: &MsdValue,
    extras: &mut Extras,
) -> bool {
    let raw = value.param(1).unwrap_or("");
    match tag {
        "BPMS" => {
            extras.set_raw(tag, raw);
            tables.tempos = parse_beat_value_pairs(raw, tag);
        }
        "STOPS" | "FREEZES" => {
            // Freezes alias stops; later entries win at equal beats.
            extras.set_raw(tag, raw);
            tables.stops.extend(parse_beat_value_pairs(raw, tag));
            tables
                .stops
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }
        "DELAYS" => {
            extras.set_raw(tag, raw);
            tables.delays = parse_beat_value_pairs(raw, tag);
        }
        "WARPS" => {
            extras.set_raw(tag, raw);
            tables.warps = parse_beat_value_pairs(raw, tag);
        }
        "SCROLLS" => {
            extras.set_raw(tag, raw);
            tables.scrolls = parse_beat_value_pairs(raw, tag);
        }
        "SPEEDS" => {
            extras.set_raw(tag, raw);
            tables.speeds = parse_speed_segments(raw, tag);
        }
        "FAKES" => {
            extras.set_raw(tag, raw);
            tables.fakes = parse_beat_value_pairs(raw, tag);
        }
        "TICKCOUNTS" => {
            extras.set_raw(tag, raw);
            tables.tick_counts = parse_beat_int_pairs(raw, tag);
        }
        "TIMESIGNATURES" => {
            extras.set_raw(tag, raw);
            tables.time_signatures = parse_time_signatures(raw, tag);
        }
        "COMBOS" => {
            extras.set_raw(tag, raw);
            tables.combos = parse_combo_counts(raw, tag);
        }
        "LABELS" => {
            extras.set_raw(tag, raw);
            tables.labels = parse_labels(raw, tag);
        }
        "ATTACKS" => {
            let params = param_list(value);
            extras.set_raw(tag, params.join(":"));
            tables.attacks = parse_attacks(&params);
        }
        _ => return false,
    }
    true
}

impl ChartBuilder {
    /// Build from the song-level six-parameter `NOTES` value: steps type,
    /// description, difficulty, meter, radar CSV and the measure grid.
    ///
    /// Stray separators show up in the wild, so the trailing fields are
    /// taken right-aligned from the parameter list and the description
    /// absorbs whatever sits between.
    fn from_song_notes(value: &MsdValue) -> Self {
        let mut builder = Self::default();
        let last = value.params.len() - 1;
        let steps_type_raw = value.param(1).unwrap_or("");
        builder.steps_type_tag = steps_type_raw.trim().to_string();
        builder.steps_type = StepsType::from_tag(steps_type_raw);
        let description = &value.params[2..last - 3];
        builder.description = if description.iter().all(|p| p.trim().is_empty()) {
            String::new()
        } else {
            description.join(":").trim().to_string()
        };
        let difficulty_raw = value.param(last - 3).unwrap_or("");
        builder.difficulty = Difficulty::from_tag(difficulty_raw);
        if builder.difficulty.is_none() {
            tracing::warn!("Unknown difficulty '{}'", difficulty_raw.trim());
        }
        let meter_raw = value.param(last - 2).unwrap_or("").trim().to_string();
        match meter_raw.parse::<i32>() {
            Ok(meter) => builder.meter = Some(meter),
            Err(_) => tracing::warn!("Failed to parse meter: '{}', defaulting to 1", meter_raw),
        }
        let radar_raw = value.param(last - 1).unwrap_or("");
        builder.extras.set_raw("RADARVALUES", radar_raw);
        builder.radar_values = parse_radar_values(radar_raw);
        builder.grid = Some(value.param(last).unwrap_or("").to_string());
        builder
    }
}

fn parse_radar_values(raw: &str) -> Vec<f64> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .filter_map(|v| v.parse::<f64>().ok())
        .collect()
}

fn param_list(value: &MsdValue) -> Vec<String> {
    value.params.iter().skip(1).cloned().collect()
}

fn scalar_string(dest: &mut String, tag: &str, value: &MsdValue, extras: &mut Extras) {
    let raw = value.param(1).unwrap_or("");
    extras.set_raw(tag, raw);
    *dest = raw.trim().to_string();
}

fn scalar_f64(dest: &mut Option<f64>, tag: &str, value: &MsdValue, extras: &mut Extras) {
    let raw = value.param(1).unwrap_or("");
    extras.set_raw(tag, raw);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) => *dest = Some(parsed),
        Err(_) => tracing::warn!("Failed to parse {}: '{}'", tag, trimmed),
    }
}

fn scalar_extras_only(tag: &str, value: &MsdValue, extras: &mut Extras) {
    let raw = value.param(1).unwrap_or("");
    extras.set_raw(tag, raw);
    extras.set_str(tag, raw.trim());
}
