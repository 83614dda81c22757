mod air_log;
mod flat_heart_rate;
mod health_archive;
pub mod schema;

pub use air_log::AirLogDecoder;
pub use flat_heart_rate::FlatHeartRateDecoder;
pub use health_archive::HealthArchiveDecoder;

use serde_json::Value;

/// Numbers pass through; numeric strings are accepted because some exporters
/// quote every scalar.
pub(crate) fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub(crate) fn header_position(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
}
