//! INI sub-format used by pack metadata.
//!
//! A file is a list of `[Group]` sections of `key=value` lines. Comments
//! begin with `;`, `#`, `//` or `--`. Duplicate keys within a group keep
//! the first occurrence and warn on the rest. Deliberately separate from
//! the MSD pipeline.

/// One `[name]` section and its entries in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    /// First value recorded for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed INI document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniFile {
    pub sections: Vec<IniSection>,
}

impl IniFile {
    /// Parse a text buffer. Parsing is total; malformed lines are logged
    /// and skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut file = Self::default();
        let mut current: Option<IniSection> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || is_comment(line) {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                if let Some(done) = current.take() {
                    file.sections.push(done);
                }
                current = Some(IniSection {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!("Ignoring INI line without '=': '{}'", line);
                continue;
            };
            let Some(section) = current.as_mut() else {
                tracing::warn!("Ignoring INI entry before any section: '{}'", line);
                continue;
            };
            let key = key.trim().to_string();
            if section.entries.iter().any(|(k, _)| *k == key) {
                tracing::warn!(
                    "Duplicate key '{}' in section [{}]; keeping the first",
                    key,
                    section.name
                );
                continue;
            }
            section.entries.push((key, value.trim().to_string()));
        }
        if let Some(done) = current.take() {
            file.sections.push(done);
        }
        file
    }

    /// Section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Serialize back to text.
    #[must_use]
    pub fn write(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in &section.entries {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with(';')
        || line.starts_with('#')
        || line.starts_with("//")
        || line.starts_with("--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_and_entries_parse() {
        let ini = IniFile::parse("[Group]\ntitle=Pack\nbanner=pack.png\n");
        let section = ini.section("Group").unwrap();
        assert_eq!(section.get("title"), Some("Pack"));
        assert_eq!(section.get("banner"), Some("pack.png"));
    }

    #[test]
    fn comments_of_all_flavors_are_skipped() {
        let ini = IniFile::parse("; a\n# b\n// c\n-- d\n[G]\nk=v\n");
        assert_eq!(ini.sections.len(), 1);
        assert_eq!(ini.section("G").unwrap().entries.len(), 1);
    }

    #[test]
    fn duplicate_keys_keep_the_first() {
        let ini = IniFile::parse("[G]\nk=first\nk=second\n");
        assert_eq!(ini.section("G").unwrap().get("k"), Some("first"));
    }

    #[test]
    fn write_round_trips() {
        let text = "[Group]\ntitle=Pack\n";
        let ini = IniFile::parse(text);
        assert_eq!(ini.write(), text);
        assert_eq!(IniFile::parse(&ini.write()), ini);
    }

    #[test]
    fn entries_before_a_section_are_dropped() {
        let ini = IniFile::parse("stray=1\n[G]\nk=v\n");
        assert_eq!(ini.sections.len(), 1);
        assert!(ini.section("G").unwrap().get("stray").is_none());
    }
}
