use crate::errors::{DecodeError, LayoutRejection};
use crate::formats::{AirLogDecoder, FlatHeartRateDecoder, HealthArchiveDecoder};
use crate::model::{Decoded, SignalKind};

pub trait SignalDecoder {
    fn name(&self) -> &'static str;
    /// Stream the produced records belong to.
    fn signal(&self) -> SignalKind;
    fn decode(&self, content: &str) -> Result<Decoded, DecodeError>;
}

/// Heart-rate layouts in preference order: raw archive rows, then the
/// flattened cache.
const HEART_RATE_LAYOUTS: &[&dyn SignalDecoder] = &[&HealthArchiveDecoder, &FlatHeartRateDecoder];

/// Air logs have a single layout and the decoder cannot reject a file.
pub fn decode_air_log(content: &str) -> Decoded {
    AirLogDecoder.decode_lines(content.lines())
}

pub fn decode_heart_rate_file(content: &str) -> Result<Decoded, DecodeError> {
    decode_as(SignalKind::HeartRate, content, HEART_RATE_LAYOUTS)
}

/// Offers `content` to every decoder of `signal` in order and keeps the first
/// layout that accepts it. Decoders for the other stream are not consulted.
pub fn decode_as(
    signal: SignalKind,
    content: &str,
    decoders: &[&dyn SignalDecoder],
) -> Result<Decoded, DecodeError> {
    let mut rejections = Vec::new();

    for decoder in decoders.iter().filter(|decoder| decoder.signal() == signal) {
        match decoder.decode(content) {
            Ok(decoded) => return Ok(decoded),
            Err(DecodeError::FormatMismatch { decoder, reason }) => {
                rejections.push(LayoutRejection { decoder, reason });
            }
            Err(err) => return Err(err),
        }
    }

    Err(DecodeError::UnrecognisedLayout { signal, rejections })
}
