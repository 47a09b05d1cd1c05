//! The value scanner.

use memchr::memchr;

/// One tagged value: `params[0]` is the tag, the rest are its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsdValue {
    pub params: Vec<String>,
}

impl MsdValue {
    /// The tag, uppercased by convention at the dispatch layer.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.params.first().map_or("", String::as_str)
    }

    /// Parameter by index (0 is the tag itself).
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }
}

/// Tokenize a text buffer into a lazy sequence of values.
#[must_use]
pub fn tokenize(text: &str) -> MsdTokenizer<'_> {
    MsdTokenizer::new(text)
}

/// Lazy MSD value iterator.
pub struct MsdTokenizer<'a> {
    text: &'a str,
    pos: usize,
    /// A non-whitespace byte has been seen since the last newline.
    line_has_content: bool,
    /// Position just past the previous value's `;`, when it had one.
    after_terminator: Option<usize>,
}

impl<'a> MsdTokenizer<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            text,
            pos: 0,
            line_has_content: false,
            after_terminator: None,
        }
    }

    fn read_value(&mut self) -> MsdValue {
        let bytes = self.text.as_bytes();
        let mut params: Vec<String> = Vec::new();
        let mut cur = String::new();
        let mut seg = self.pos;

        loop {
            if self.pos >= bytes.len() {
                cur.push_str(&self.text[seg..self.pos]);
                params.push(cur);
                return MsdValue { params };
            }
            match bytes[self.pos] {
                b'\\' => {
                    cur.push_str(&self.text[seg..self.pos]);
                    self.pos += 1;
                    if self.pos < bytes.len() {
                        let end = self.pos + utf8_len(bytes[self.pos]);
                        let end = end.min(bytes.len());
                        cur.push_str(&self.text[self.pos..end]);
                        self.pos = end;
                    }
                    seg = self.pos;
                }
                b'/' if bytes.get(self.pos + 1) == Some(&b'/') => {
                    cur.push_str(&self.text[seg..self.pos]);
                    self.pos = skip_to_newline(self.text, self.pos);
                    seg = self.pos;
                }
                b':' => {
                    cur.push_str(&self.text[seg..self.pos]);
                    params.push(std::mem::take(&mut cur));
                    self.pos += 1;
                    seg = self.pos;
                }
                b';' => {
                    cur.push_str(&self.text[seg..self.pos]);
                    params.push(cur);
                    self.pos += 1;
                    self.after_terminator = Some(self.pos);
                    self.line_has_content = true;
                    return MsdValue { params };
                }
                b'\n' => {
                    // Missing-terminator recovery: a value opening the next
                    // line closes this one.
                    let mut probe = self.pos + 1;
                    while probe < bytes.len()
                        && matches!(bytes[probe], b' ' | b'\t' | b'\r')
                    {
                        probe += 1;
                    }
                    if probe < bytes.len() && bytes[probe] == b'#' {
                        cur.push_str(&self.text[seg..self.pos]);
                        cur.truncate(cur.trim_end().len());
                        params.push(cur);
                        self.line_has_content = false;
                        self.pos += 1;
                        return MsdValue { params };
                    }
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }
}

impl Iterator for MsdTokenizer<'_> {
    type Item = MsdValue;

    fn next(&mut self) -> Option<MsdValue> {
        let bytes = self.text.as_bytes();
        loop {
            if self.pos >= bytes.len() {
                return None;
            }
            match bytes[self.pos] {
                b'/' if bytes.get(self.pos + 1) == Some(&b'/') => {
                    self.pos = skip_to_newline(self.text, self.pos);
                }
                b'\\' => {
                    // An escape outside a value consumes both characters.
                    self.pos = (self.pos + 2).min(bytes.len());
                    self.line_has_content = true;
                }
                b'#' => {
                    if !self.line_has_content || self.after_terminator == Some(self.pos) {
                        self.pos += 1;
                        return Some(self.read_value());
                    }
                    self.pos += 1;
                }
                b'\n' => {
                    self.pos += 1;
                    self.line_has_content = false;
                }
                c if c.is_ascii_whitespace() => self.pos += 1,
                _ => {
                    self.pos += 1;
                    self.line_has_content = true;
                }
            }
        }
    }
}

/// Position of the next newline at or after `from`, or end of text.
fn skip_to_newline(text: &str, from: usize) -> usize {
    memchr(b'\n', &text.as_bytes()[from..]).map_or(text.len(), |i| from + i)
}

/// Length of the UTF-8 sequence starting with `lead`. `lead` is always a
/// boundary byte here because it follows an ASCII escape character.
fn utf8_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}
