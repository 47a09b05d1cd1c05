//! Tokenizer for the MSD tagged-value container format.
//!
//! Both simfile variants are sequences of values shaped like
//! `#TAG:param1:param2:...;`. The tokenizer is total: any byte sequence
//! produces some sequence of values and never signals failure. Semantic
//! validation belongs to the property layer.
//!
//! Lexical rules:
//! - a value begins at `#` when it is the first non-whitespace character
//!   of a line, or immediately after the previous value's `;` terminator;
//! - `:` separates parameters, `;` terminates the value;
//! - `\` escapes the following character; inside a value the escaped
//!   character is taken literally, outside a value both characters are
//!   discarded;
//! - `//` starts a comment running to the end of the line, inside and
//!   outside values;
//! - a missing terminator is recovered when the next line opens a new
//!   value (the last parameter is trimmed of trailing whitespace), and
//!   truncation mid-value emits the partial value.

mod tokenizer;

pub use tokenizer::{MsdTokenizer, MsdValue, tokenize};

/// Escape a parameter for writing: backslashes, separators, terminators
/// and comment introducers survive a later tokenize.
#[must_use]
pub fn escape_param(param: &str) -> String {
    let mut out = String::with_capacity(param.len());
    let mut prev_slash = false;
    for c in param.chars() {
        match c {
            '\\' | ':' | ';' => {
                out.push('\\');
                out.push(c);
                prev_slash = false;
            }
            '/' if prev_slash => {
                out.push('\\');
                out.push('/');
                prev_slash = false;
            }
            '/' => {
                out.push('/');
                prev_slash = true;
            }
            _ => {
                out.push(c);
                prev_slash = false;
            }
        }
    }
    out
}
