use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Offset-bearing layouts seen in the wild besides RFC 3339; `%z` accepts
/// `-0700` as well as `-07:00`.
static OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

static NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// The single clock every series is expressed on. Offset-bearing timestamps
/// are converted into `zone` and lose their offset; naive timestamps are taken
/// to already be on this clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    zone: Tz,
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl ReferenceClock {
    pub fn utc() -> Self {
        Self { zone: Tz::UTC }
    }

    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        let cleaned = raw.replace('\u{a0}', " ");
        let trimmed = cleaned.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(self.convert(dt));
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
                return Some(self.convert(dt));
            }
        }

        // A trailing `Z` on an otherwise naive layout still means UTC.
        if let Some(utc_body) = trimmed.strip_suffix(['Z', 'z']) {
            return parse_naive(utc_body.trim_end())
                .map(|naive| self.zone.from_utc_datetime(&naive).naive_local());
        }

        parse_naive(trimmed)
    }

    fn convert(&self, dt: DateTime<FixedOffset>) -> NaiveDateTime {
        dt.with_timezone(&self.zone).naive_local()
    }
}

fn parse_naive(value: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

pub fn to_micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

pub fn from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// Finds the first `YYYY-MM-DD` token in a file name.
pub fn date_token(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    (0..=bytes.len() - 10).find_map(|start| {
        let window = &bytes[start..start + 10];
        let shaped = window.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        });
        if !shaped {
            return None;
        }
        let token = name.get(start..start + 10)?;
        NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
    })
}
