use crate::errors::DecodeError;
use crate::model::{Decoded, FieldValue, RawRecord, SignalKind};
use crate::registry::SignalDecoder;

use super::header_position;
use super::schema::{CONTEXT, HR_BPM, SOURCE, TIMESTAMP};

/// Decoder for the flattened heart-rate layout (`timestamp,hr_bpm,source,context`).
pub struct FlatHeartRateDecoder;

impl Default for FlatHeartRateDecoder {
    fn default() -> Self {
        Self
    }
}

impl FlatHeartRateDecoder {
    const NAME: &'static str = "FLAT_HEART_RATE";
}

impl SignalDecoder for FlatHeartRateDecoder {
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

        let (Some(ts_idx), Some(bpm_idx)) = (
            header_position(&headers, TIMESTAMP),
            header_position(&headers, HR_BPM),
        ) else {
            return Err(DecodeError::FormatMismatch {
                decoder: Self::NAME,
                reason: format!("expected '{TIMESTAMP}' and '{HR_BPM}' columns"),
            });
        };
        let source_idx = header_position(&headers, SOURCE);
        let context_idx = header_position(&headers, CONTEXT);

        let mut decoded = Decoded::new(Self::NAME);
        for row in reader.records() {
            let Ok(row) = row else {
                decoded.skip_line();
                continue;
            };

            let timestamp = row.get(ts_idx).map(str::trim).unwrap_or_default();
            if timestamp.is_empty() {
                decoded.missing_field();
                continue;
            }

            let bpm = row
                .get(bpm_idx)
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null);

            decoded.push(
                RawRecord::new(timestamp)
                    .with_field(HR_BPM, bpm)
                    .with_field(
                        SOURCE,
                        FieldValue::optional_text(source_idx.and_then(|idx| row.get(idx))),
                    )
                    .with_field(
                        CONTEXT,
                        FieldValue::optional_text(context_idx.and_then(|idx| row.get(idx))),
                    ),
            );
        }

        Ok(decoded)
    }
}
