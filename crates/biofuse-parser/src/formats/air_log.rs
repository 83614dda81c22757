use serde_json::{Map, Value};

use crate::errors::DecodeError;
use crate::literal::parse_literal;
use crate::model::{Decoded, FieldValue, RawRecord, SignalKind};
use crate::registry::SignalDecoder;

use super::schema::TIMESTAMP;

/// Decoder for the environmental logger's output: a JSON array written one
/// element per line, read while the logger may still be appending to it.
pub struct AirLogDecoder;

impl Default for AirLogDecoder {
    fn default() -> Self {
        Self
    }
}

impl AirLogDecoder {
    const NAME: &'static str = "AIR_LOG";

    pub fn decode_lines<'a, I>(&self, lines: I) -> Decoded
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut decoded = Decoded::new(Self::NAME);

        for line in lines {
            let cleaned = clean_line(line);
            if cleaned.is_empty() {
                continue;
            }

            let Some(object) = parse_object(cleaned) else {
                decoded.skip_line();
                continue;
            };

            let Some(timestamp) = object.get(TIMESTAMP).and_then(Value::as_str) else {
                decoded.missing_field();
                continue;
            };

            let mut record = RawRecord::new(timestamp);
            for (key, value) in &object {
                if key == TIMESTAMP {
                    continue;
                }
                if let Some(field) = FieldValue::from_json(value) {
                    record.fields.insert(key.clone(), field);
                }
            }
            decoded.push(record);
        }

        decoded
    }
}

impl SignalDecoder for AirLogDecoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signal(&self) -> SignalKind {
        SignalKind::Air
    }

    fn decode(&self, content: &str) -> Result<Decoded, DecodeError> {
        Ok(self.decode_lines(content.lines()))
    }
}

/// Strict JSON first; lines carrying `NaN` or `Infinity` go through the
/// literal normaliser, which turns those tokens into nulls.
fn parse_object(line: &str) -> Option<Map<String, Value>> {
    let value = serde_json::from_str::<Value>(line)
        .ok()
        .or_else(|| parse_literal(line).ok())?;
    match value {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

/// Removes array brackets and element separators around a single element.
fn clean_line(line: &str) -> &str {
    let mut current = line.trim();
    loop {
        let next = current
            .strip_prefix('[')
            .unwrap_or(current)
            .trim_start();
        let next = next.strip_suffix(',').unwrap_or(next).trim_end();
        let next = next.strip_suffix(']').unwrap_or(next).trim_end();
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_structural_delimiters() {
        assert_eq!(clean_line("["), "");
        assert_eq!(clean_line("  ]  "), "");
        assert_eq!(clean_line(r#"{"a":1},"#), r#"{"a":1}"#);
        assert_eq!(clean_line(r#"[{"a":1}]"#), r#"{"a":1}"#);
        assert_eq!(clean_line(r#"{"a":1} ,]"#), r#"{"a":1}"#);
    }

    #[test]
    fn non_finite_fields_do_not_cost_the_record() {
        let decoded = AirLogDecoder.decode_lines([
            r#"{"timestamp":"2025-07-28T00:00:10Z","co2_ppm":600,"humidity_pct":NaN},"#,
            r#"{"timestamp":"2025-07-28T00:00:20Z","co2_ppm":610,"temp_c":-Infinity}"#,
        ]);

        assert_eq!(decoded.stats.decoded, 2);
        assert_eq!(decoded.stats.skipped_lines, 0);
        assert_eq!(decoded.records[0].number("co2_ppm"), Some(600.0));
        assert_eq!(decoded.records[0].field("humidity_pct"), Some(&FieldValue::Null));
        assert_eq!(decoded.records[1].field("temp_c"), Some(&FieldValue::Null));
    }
}
