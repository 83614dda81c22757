pub const TIMESTAMP: &str = "timestamp";
pub const CO2_PPM: &str = "co2_ppm";
pub const TEMP_C: &str = "temp_c";
pub const HUMIDITY_PCT: &str = "humidity_pct";
pub const HR_BPM: &str = "hr_bpm";
pub const SOURCE: &str = "source";
pub const CONTEXT: &str = "context";

/// Column holding the payload blob in raw archive rows.
pub const ARCHIVE_PAYLOAD_COLUMN: &str = "data";

/// Key holding the entry timestamp inside a heart-rate entry.
pub const BEAT_DATE_KEY: &str = "date";

/// Heart-rate entry value keys, most preferred first.
pub const BPM_VALUE_KEYS: [&str; 4] = ["Avg", "value", "Min", "Max"];
