use serde_json::{Map, Value};

use crate::errors::DecodeError;
use crate::literal::parse_literal;
use crate::model::{Decoded, FieldValue, RawRecord, SignalKind};
use crate::path::{SchemaPath, HEART_RATE_PATH, UNWRAPPED_HEART_RATE_PATH};
use crate::registry::SignalDecoder;

use super::schema::{ARCHIVE_PAYLOAD_COLUMN, BEAT_DATE_KEY, BPM_VALUE_KEYS, CONTEXT, HR_BPM, SOURCE};
use super::{header_position, numeric_value};

/// Decoder for the ingest archive: one CSV row per phone upload, the whole
/// payload stored in the `data` column as a printed literal object.
pub struct HealthArchiveDecoder;

impl Default for HealthArchiveDecoder {
    fn default() -> Self {
        Self
    }
}

impl HealthArchiveDecoder {
    const NAME: &'static str = "HEALTH_ARCHIVE";

    /// Paths tried in order; the first one that resolves wins.
    pub const PATHS: [SchemaPath; 2] = [HEART_RATE_PATH, UNWRAPPED_HEART_RATE_PATH];

    /// Extracts heart-rate entries from one payload blob into `out`.
    pub fn decode_payload(&self, blob: &str, out: &mut Decoded) {
        let payload = match parse_literal(blob) {
            Ok(payload) => payload,
            Err(_) => {
                out.skip_line();
                return;
            }
        };

        let Some(entries) = Self::PATHS.iter().find_map(|path| path.walk(&payload).ok()) else {
            out.missing_field();
            return;
        };

        for entry in entries {
            match entry.as_object().and_then(beat_record) {
                Some(record) => out.push(record),
                None => out.missing_field(),
            }
        }
    }
}

impl SignalDecoder for HealthArchiveDecoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn signal(&self) -> SignalKind {
        SignalKind::HeartRate
    }

    fn decode(&self, content: &str) -> Result<Decoded, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|source| DecodeError::Csv {
                decoder: Self::NAME,
                source,
            })?
            .clone();

        let payload_idx = header_position(&headers, ARCHIVE_PAYLOAD_COLUMN).ok_or_else(|| {
            DecodeError::FormatMismatch {
                decoder: Self::NAME,
                reason: format!("missing '{ARCHIVE_PAYLOAD_COLUMN}' column"),
            }
        })?;

        let mut decoded = Decoded::new(Self::NAME);
        for row in reader.records() {
            let Ok(row) = row else {
                decoded.skip_line();
                continue;
            };
            match row.get(payload_idx) {
                Some(blob) => self.decode_payload(blob, &mut decoded),
                None => decoded.skip_line(),
            }
        }

        Ok(decoded)
    }
}

fn beat_record(beat: &Map<String, Value>) -> Option<RawRecord> {
    let date = beat
        .get(BEAT_DATE_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|date| !date.is_empty())?;

    let bpm = BPM_VALUE_KEYS
        .iter()
        .find_map(|key| beat.get(*key).and_then(numeric_value));

    Some(
        RawRecord::new(date)
            .with_field(HR_BPM, bpm.map(FieldValue::Number).unwrap_or(FieldValue::Null))
            .with_field(SOURCE, text_field(beat.get(SOURCE)))
            .with_field(CONTEXT, text_field(beat.get(CONTEXT))),
    )
}

fn text_field(value: Option<&Value>) -> FieldValue {
    match value {
        Some(Value::String(text)) => FieldValue::optional_text(Some(text.as_str())),
        Some(Value::Number(number)) => FieldValue::Text(number.to_string()),
        _ => FieldValue::Null,
    }
}
