//! Fragment script parsing.
//!
//! Reads back the `implementors['<key>'] = [...]` assignments of a fragment
//! script into a [`Contribution`]. Only the assignment statements are
//! interpreted; the surrounding registration glue is ignored.

use crate::model::contribution::Contribution;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PREAMBLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\s+implementors\s*=\s*\{\s*\}").expect("valid preamble regex"));
static ASSIGNMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"implementors\[\s*'((?:[^'\\]|\\.)*)'\s*\]\s*=\s*\[")
        .expect("valid assignment regex")
});

/// Fragment parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentParseError {
    /// The script never declares `var implementors = {}`.
    MissingPreamble,
    /// An item list is not closed with `]`.
    UnterminatedList { key: String },
    /// A string literal inside an item list is not closed.
    UnterminatedString { key: String },
    /// A character that cannot appear at `offset` inside an item list.
    UnexpectedToken { key: String, offset: usize },
    /// A group key contains an invalid escape sequence.
    InvalidKey(String),
}

impl Display for FragmentParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPreamble => write!(f, "fragment does not declare `var implementors = {{}}`"),
            Self::UnterminatedList { key } => {
                write!(f, "item list for group `{key}` is not terminated")
            }
            Self::UnterminatedString { key } => {
                write!(f, "string literal in group `{key}` is not terminated")
            }
            Self::UnexpectedToken { key, offset } => {
                write!(f, "unexpected token in group `{key}` at byte {offset}")
            }
            Self::InvalidKey(value) => write!(f, "group key has invalid escapes: {value}"),
        }
    }
}

impl Error for FragmentParseError {}

/// Parses one fragment script into its contribution.
///
/// Repeated assignments to the same key keep the key's first position and the
/// last assigned items. A script without assignments yields an empty
/// contribution.
pub fn parse_fragment(script: &str) -> Result<Contribution, FragmentParseError> {
    let preamble = PREAMBLE_RE
        .find(script)
        .ok_or(FragmentParseError::MissingPreamble)?;

    let mut contribution = Contribution::new();
    let mut cursor = preamble.end();
    while let Some(captures) = ASSIGNMENT_RE.captures_at(script, cursor) {
        let (Some(whole), Some(raw_key)) = (captures.get(0), captures.get(1)) else {
            break;
        };
        let key = decode_literal(raw_key.as_str())
            .ok_or_else(|| FragmentParseError::InvalidKey(raw_key.as_str().to_string()))?;
        let (items, next) = parse_item_list(script, whole.end(), &key)?;
        contribution.insert(key, items);
        cursor = next;
    }
    Ok(contribution)
}

/// Parses list items starting right after `[`; returns the items and the byte
/// offset after the closing `]`.
fn parse_item_list(
    script: &str,
    start: usize,
    key: &str,
) -> Result<(Vec<String>, usize), FragmentParseError> {
    let bytes = script.as_bytes();
    let mut items = Vec::new();
    let mut pos = start;
    let mut expect_item = true;

    loop {
        pos = skip_whitespace(bytes, pos);
        let Some(&byte) = bytes.get(pos) else {
            return Err(FragmentParseError::UnterminatedList {
                key: key.to_string(),
            });
        };
        match byte {
            b']' => return Ok((items, pos + 1)),
            b'"' | b'\'' if expect_item => {
                let end = find_literal_end(bytes, pos + 1, byte).ok_or_else(|| {
                    FragmentParseError::UnterminatedString {
                        key: key.to_string(),
                    }
                })?;
                let item = decode_literal(&script[pos + 1..end]).ok_or_else(|| {
                    FragmentParseError::UnexpectedToken {
                        key: key.to_string(),
                        offset: pos,
                    }
                })?;
                items.push(item);
                pos = end + 1;
                expect_item = false;
            }
            b',' if !expect_item => {
                pos += 1;
                expect_item = true;
            }
            _ => {
                return Err(FragmentParseError::UnexpectedToken {
                    key: key.to_string(),
                    offset: pos,
                })
            }
        }
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

/// Returns the byte offset of the closing `quote`, skipping escaped bytes.
fn find_literal_end(bytes: &[u8], mut pos: usize, quote: u8) -> Option<usize> {
    while let Some(&byte) = bytes.get(pos) {
        match byte {
            b'\\' => pos += 2,
            b if b == quote => return Some(pos),
            _ => pos += 1,
        }
    }
    None
}

/// Decodes the body of a quoted script literal.
///
/// Handles the single-character escapes, `\xHH`, `\uXXXX` (surrogate pairs
/// combine into one character) and line continuations. Unknown escapes yield
/// the escaped character, as script engines do. Lone surrogates cannot be
/// held in a `String` and fail the decode.
fn decode_literal(raw: &str) -> Option<String> {
    if !raw.contains('\\') {
        return Some(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => out.push(char::from_u32(read_hex(&mut chars, 2)?)?),
            'u' => {
                let unit = read_hex(&mut chars, 4)?;
                let code = match unit {
                    0xD800..=0xDBFF => {
                        if chars.next()? != '\\' || chars.next()? != 'u' {
                            return None;
                        }
                        let low = read_hex(&mut chars, 4)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return None;
                        }
                        0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
                    }
                    _ => unit,
                };
                out.push(char::from_u32(code)?);
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    Some(out)
}

fn read_hex(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}
