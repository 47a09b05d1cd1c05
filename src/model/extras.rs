//! Per-entity preservation store.
//!
//! Songs, charts and events each carry an [`Extras`] bag holding three
//! kinds of side-channel data: typed values recorded by the parsers (the
//! source beat double of a timing entry, the measure-line fraction of a
//! note, a bracketed keysound index), the raw parameter strings of
//! recognized tags, and unrecognized tags kept verbatim. The writers
//! consult all three to minimize round-trip diffs.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Key under which timing parsers record the source beat double.
pub const SOURCE_BEAT: &str = "beat";
/// Key for the source line index of a lane event within its measure.
pub const SOURCE_LINE_INDEX: &str = "line-index";
/// Key for the source line count of the measure a lane event came from.
pub const SOURCE_LINE_COUNT: &str = "line-count";
/// Key for a bracketed keysound index attached to a note.
pub const KEYSOUND_INDEX: &str = "keysound";
/// Key under which attack placement records the source song time.
pub const SOURCE_TIME: &str = "time";

/// A single preserved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Extra {
    Str(CompactString),
    Double(f64),
    Int(i64),
    List(Vec<Extra>),
}

/// Key/value store preserving source formatting and unrecognized tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras {
    values: BTreeMap<CompactString, Extra>,
    raw: BTreeMap<CompactString, String>,
    unknown: Vec<(CompactString, Vec<String>)>,
}

impl Extras {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.raw.is_empty() && self.unknown.is_empty()
    }

    pub fn set(&mut self, key: impl Into<CompactString>, value: Extra) {
        self.values.insert(key.into(), value);
    }

    pub fn set_int(&mut self, key: impl Into<CompactString>, value: i64) {
        self.set(key, Extra::Int(value));
    }

    pub fn set_double(&mut self, key: impl Into<CompactString>, value: f64) {
        self.set(key, Extra::Double(value));
    }

    pub fn set_str(&mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) {
        self.set(key, Extra::Str(value.into()));
    }

    pub fn set_list(&mut self, key: impl Into<CompactString>, values: Vec<Extra>) {
        self.set(key, Extra::List(values));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Extra> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(Extra::Int(v)) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(Extra::Double(v)) => Some(*v),
            Some(Extra::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(Extra::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Record the raw parameter string of a recognized tag.
    pub fn set_raw(&mut self, tag: impl Into<CompactString>, raw: impl Into<String>) {
        self.raw.insert(tag.into(), raw.into());
    }

    /// Raw parameter string of a recognized tag, if the source carried it.
    #[must_use]
    pub fn raw(&self, tag: &str) -> Option<&str> {
        self.raw.get(tag).map(String::as_str)
    }

    /// True when the source carried the given tag at all.
    #[must_use]
    pub fn has_raw(&self, tag: &str) -> bool {
        self.raw.contains_key(tag)
    }

    /// Keep an unrecognized tag verbatim, parameters preserved as a list.
    pub fn push_unknown(&mut self, tag: impl Into<CompactString>, params: Vec<String>) {
        self.unknown.push((tag.into(), params));
    }

    /// Unrecognized tags in source order.
    #[must_use]
    pub fn unknown_tags(&self) -> &[(CompactString, Vec<String>)] {
        &self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values_round_trip() {
        let mut extras = Extras::new();
        extras.set_int(SOURCE_LINE_INDEX, 3);
        extras.set_double(SOURCE_BEAT, 1.5);
        extras.set_str("token", "2");

        assert_eq!(extras.get_int(SOURCE_LINE_INDEX), Some(3));
        assert_eq!(extras.get_double(SOURCE_BEAT), Some(1.5));
        assert_eq!(extras.get_str("token"), Some("2"));
        assert_eq!(extras.get_int("missing"), None);
    }

    #[test]
    fn raw_strings_are_separate_from_values() {
        let mut extras = Extras::new();
        extras.set_raw("BPMS", "0.000=120.000");
        assert!(extras.has_raw("BPMS"));
        assert_eq!(extras.raw("BPMS"), Some("0.000=120.000"));
        assert!(extras.get("BPMS").is_none());
    }

    #[test]
    fn unknown_tags_keep_order_and_params() {
        let mut extras = Extras::new();
        extras.push_unknown("BGCHANGES", vec!["0.000=bg.avi".into()]);
        extras.push_unknown("KEYSOUNDS", vec!["a.wav".into(), "b.wav".into()]);

        let tags = extras.unknown_tags();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].0, "BGCHANGES");
        assert_eq!(tags[1].1.len(), 2);
    }
}
