//! Parsers for the `beat=value` comma-separated property family.
//!
//! Every parser is best-effort: malformed entries are logged and skipped,
//! the survivors are returned sorted by beat. Callers keep the raw string
//! separately for round-trip output.

/// Parse `beat=value[,beat=value]*` into float pairs.
#[must_use]
pub fn parse_beat_value_pairs(raw: &str, tag: &str) -> Vec<(f64, f64)> {
    let mut result = Vec::new();
    for entry in entries(raw) {
        let Some((beat, value)) = entry.split_once('=') else {
            tracing::warn!("Malformed entry in {}: '{}'", tag, entry);
            continue;
        };
        match (beat.trim().parse::<f64>(), value.trim().parse::<f64>()) {
            (Ok(beat), Ok(value)) => result.push((beat, value)),
            _ => tracing::warn!("Malformed entry in {}: '{}'", tag, entry),
        }
    }
    sort_by_beat(&mut result, |e| e.0);
    result
}

/// Parse `beat=count[,beat=count]*` into integer-valued pairs.
#[must_use]
pub fn parse_beat_int_pairs(raw: &str, tag: &str) -> Vec<(f64, i32)> {
    let mut result = Vec::new();
    for entry in entries(raw) {
        let Some((beat, value)) = entry.split_once('=') else {
            tracing::warn!("Malformed entry in {}: '{}'", tag, entry);
            continue;
        };
        match (beat.trim().parse::<f64>(), value.trim().parse::<i32>()) {
            (Ok(beat), Ok(value)) => result.push((beat, value)),
            _ => tracing::warn!("Malformed entry in {}: '{}'", tag, entry),
        }
    }
    sort_by_beat(&mut result, |e| e.0);
    result
}

/// Parse `beat=numerator=denominator[,...]` fraction lists.
#[must_use]
pub fn parse_time_signatures(raw: &str, tag: &str) -> Vec<(f64, i32, i32)> {
    let mut result = Vec::new();
    for entry in entries(raw) {
        let mut parts = entry.split('=');
        let parsed = (
            parts.next().and_then(|p| p.trim().parse::<f64>().ok()),
            parts.next().and_then(|p| p.trim().parse::<i32>().ok()),
            parts.next().and_then(|p| p.trim().parse::<i32>().ok()),
        );
        match parsed {
            (Some(beat), Some(numerator), Some(denominator)) if parts.next().is_none() => {
                result.push((beat, numerator, denominator));
            }
            _ => tracing::warn!("Malformed entry in {}: '{}'", tag, entry),
        }
    }
    sort_by_beat(&mut result, |e| e.0);
    result
}

/// Parse `beat=speed=length=mode[,...]` interpolated-scroll lists. Mode 0
/// measures the length in beats, mode 1 in seconds.
#[must_use]
pub fn parse_speed_segments(raw: &str, tag: &str) -> Vec<(f64, f64, f64, i32)> {
    let mut result = Vec::new();
    for entry in entries(raw) {
        let mut parts = entry.split('=');
        let parsed = (
            parts.next().and_then(|p| p.trim().parse::<f64>().ok()),
            parts.next().and_then(|p| p.trim().parse::<f64>().ok()),
            parts.next().and_then(|p| p.trim().parse::<f64>().ok()),
            parts.next().and_then(|p| p.trim().parse::<i32>().ok()),
        );
        match parsed {
            (Some(beat), Some(speed), Some(length), Some(mode)) if matches!(mode, 0 | 1) => {
                result.push((beat, speed, length, mode));
            }
            _ => tracing::warn!("Malformed entry in {}: '{}'", tag, entry),
        }
    }
    sort_by_beat(&mut result, |e| e.0);
    result
}

/// Parse `beat=hit[=miss][,...]` combo lists. A missing miss multiplier
/// defaults to the hit multiplier.
#[must_use]
pub fn parse_combo_counts(raw: &str, tag: &str) -> Vec<(f64, i32, i32)> {
    let mut result = Vec::new();
    for entry in entries(raw) {
        let mut parts = entry.split('=');
        let beat = parts.next().and_then(|p| p.trim().parse::<f64>().ok());
        let hit = parts.next().and_then(|p| p.trim().parse::<i32>().ok());
        let miss = parts.next().map(|p| p.trim().parse::<i32>().ok());
        match (beat, hit, miss) {
            (Some(beat), Some(hit), None) => result.push((beat, hit, hit)),
            (Some(beat), Some(hit), Some(Some(miss))) => result.push((beat, hit, miss)),
            _ => tracing::warn!("Malformed entry in {}: '{}'", tag, entry),
        }
    }
    sort_by_beat(&mut result, |e| e.0);
    result
}

/// Parse `beat=text[,...]` label lists. The text is split on the first
/// `=` only, so labels may themselves contain `=`.
#[must_use]
pub fn parse_labels(raw: &str, tag: &str) -> Vec<(f64, String)> {
    let mut result = Vec::new();
    for entry in entries(raw) {
        let Some((beat, text)) = entry.split_once('=') else {
            tracing::warn!("Malformed entry in {}: '{}'", tag, entry);
            continue;
        };
        match beat.trim().parse::<f64>() {
            Ok(beat) => result.push((beat, text.trim().to_string())),
            Err(_) => tracing::warn!("Malformed entry in {}: '{}'", tag, entry),
        }
    }
    sort_by_beat(&mut result, |e| e.0);
    result
}

/// One timed modifier burst, specified in song-time seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackSpec {
    pub start_seconds: f64,
    pub length_seconds: f64,
    pub mods: Vec<String>,
}

/// Parse the `TIME=..:LEN=..:MODS=..` parameter sequence of an attack tag.
/// `params` excludes the tag itself.
#[must_use]
pub fn parse_attacks(params: &[String]) -> Vec<AttackSpec> {
    let mut result: Vec<AttackSpec> = Vec::new();
    for param in params {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let Some((key, value)) = param.split_once('=') else {
            tracing::warn!("Malformed attack parameter: '{}'", param);
            continue;
        };
        let key = key.trim().to_ascii_uppercase();
        match key.as_str() {
            "TIME" => match value.trim().parse::<f64>() {
                Ok(start) => result.push(AttackSpec {
                    start_seconds: start,
                    ..AttackSpec::default()
                }),
                Err(_) => tracing::warn!("Malformed attack time: '{}'", param),
            },
            "LEN" | "END" => {
                let Some(attack) = result.last_mut() else {
                    tracing::warn!("Attack length before any TIME: '{}'", param);
                    continue;
                };
                match value.trim().parse::<f64>() {
                    Ok(v) if key == "END" => attack.length_seconds = v - attack.start_seconds,
                    Ok(v) => attack.length_seconds = v,
                    Err(_) => tracing::warn!("Malformed attack length: '{}'", param),
                }
            }
            "MODS" => {
                let Some(attack) = result.last_mut() else {
                    tracing::warn!("Attack mods before any TIME: '{}'", param);
                    continue;
                };
                attack.mods = value
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => tracing::warn!("Unknown attack parameter: '{}'", param),
        }
    }
    result
}

fn entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|e| !e.is_empty())
}

fn sort_by_beat<T>(entries: &mut [T], beat: impl Fn(&T) -> f64) {
    entries.sort_by(|a, b| beat(a).partial_cmp(&beat(b)).unwrap_or(std::cmp::Ordering::Equal));
}
