//! Normalisation of literal-object payloads into JSON.
//!
//! Archive rows carry the phone payload as it was printed by the ingest
//! process, which is not always JSON: keys and strings may be single-quoted,
//! quotes may be typographic, null and booleans may be spelled `None`,
//! `True` and `False`, and non-breaking spaces show up between tokens. The
//! rewrite below works token by token so that apostrophes and double quotes
//! inside strings survive.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiteralError {
    #[error("unterminated string starting at character {0}")]
    UnterminatedString(usize),
    #[error("payload is empty")]
    Empty,
    #[error("normalised payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_literal(raw: &str) -> Result<Value, LiteralError> {
    let normalised = normalize_literal(raw)?;
    Ok(serde_json::from_str(&normalised)?)
}

pub fn normalize_literal(raw: &str) -> Result<String, LiteralError> {
    let body = strip_outer_quotes(raw.trim());
    if body.is_empty() {
        return Err(LiteralError::Empty);
    }

    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len() + 16);
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if let Some(closer) = string_closer(ch) {
            idx = copy_string(&chars, idx, closer, &mut out)?;
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = idx;
            while idx < chars.len() && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '_') {
                idx += 1;
            }
            let word: String = chars[start..idx].iter().collect();
            let mapped = map_bare_word(&word);
            if mapped == "null" && out.ends_with(['-', '+']) {
                out.pop();
            }
            out.push_str(mapped);
            continue;
        }
        out.push(if ch == '\u{a0}' { ' ' } else { ch });
        idx += 1;
    }

    Ok(out)
}

#[derive(Clone, Copy)]
enum Closer {
    Single,
    SmartSingle,
    Double,
    SmartDouble,
}

impl Closer {
    fn closes(self, ch: char) -> bool {
        match self {
            Closer::Single => ch == '\'',
            Closer::SmartSingle => ch == '\u{2019}',
            Closer::Double => ch == '"',
            Closer::SmartDouble => ch == '\u{201d}',
        }
    }

    fn is_double(self) -> bool {
        matches!(self, Closer::Double | Closer::SmartDouble)
    }
}

fn string_closer(ch: char) -> Option<Closer> {
    match ch {
        '\'' => Some(Closer::Single),
        '\u{2018}' | '\u{2019}' => Some(Closer::SmartSingle),
        '"' => Some(Closer::Double),
        '\u{201c}' | '\u{201d}' => Some(Closer::SmartDouble),
        _ => None,
    }
}

/// Copies the string opening at `start` as a JSON string and returns the index
/// just past its closing quote.
fn copy_string(
    chars: &[char],
    start: usize,
    closer: Closer,
    out: &mut String,
) -> Result<usize, LiteralError> {
    out.push('"');
    let mut idx = start + 1;

    while idx < chars.len() {
        let ch = chars[idx];
        if closer.closes(ch) {
            out.push('"');
            return Ok(idx + 1);
        }
        match ch {
            '\\' => {
                let Some(&next) = chars.get(idx + 1) else {
                    return Err(LiteralError::UnterminatedString(start));
                };
                match next {
                    '\'' => out.push('\''),
                    '"' => out.push_str("\\\""),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
                idx += 2;
                continue;
            }
            '"' if !closer.is_double() => out.push_str("\\\""),
            '\u{a0}' => out.push(' '),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
        idx += 1;
    }

    Err(LiteralError::UnterminatedString(start))
}

fn map_bare_word(word: &str) -> &str {
    match word {
        "None" | "nan" | "NaN" | "inf" | "Infinity" => "null",
        "True" => "true",
        "False" => "false",
        other => other,
    }
}

fn strip_outer_quotes(raw: &str) -> &str {
    let stripped = raw.trim_matches('"').trim();
    if stripped.len() != raw.len() && (stripped.starts_with('{') || stripped.starts_with('[')) {
        stripped
    } else {
        raw
    }
}
