use std::collections::BTreeMap;

use biofuse_parser::RawRecord;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::timestamps::{from_micros, to_micros, ReferenceClock};
use crate::types::{FieldMap, FieldValue, NormalizedSample, NormalizedSeries};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub input: usize,
    pub unparsable_timestamps: usize,
    pub missing_primary: usize,
    pub output: usize,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub series: NormalizedSeries,
    pub stats: NormalizeStats,
}

/// Aggregates records into fixed, right-open buckets of `width`, averaging
/// every numeric field over the samples that carry it. Buckets are aligned
/// to multiples of `width` since the Unix epoch; empty buckets are omitted.
pub fn normalize_bucketed(
    records: &[RawRecord],
    primary: &str,
    width: Duration,
    clock: &ReferenceClock,
) -> Result<Normalized> {
    let width_us = match width.num_microseconds() {
        Some(micros) if micros > 0 => micros,
        Some(_) => {
            return Err(PipelineError::Validation(format!(
                "bucket width must be positive, got {width}"
            )))
        }
        None => {
            return Err(PipelineError::Validation(format!(
                "bucket width {width} does not fit in microseconds"
            )))
        }
    };

    let mut stats = NormalizeStats {
        input: records.len(),
        ..NormalizeStats::default()
    };
    let mut buckets: BTreeMap<i64, BTreeMap<&str, (f64, usize)>> = BTreeMap::new();

    for record in records {
        let Some(timestamp) = clock.parse(&record.timestamp_raw) else {
            stats.unparsable_timestamps += 1;
            continue;
        };
        if record.number(primary).is_none() {
            stats.missing_primary += 1;
            continue;
        }

        let start = to_micros(timestamp).div_euclid(width_us) * width_us;
        let sums = buckets.entry(start).or_default();
        for (name, value) in &record.fields {
            if let Some(number) = value.as_f64().filter(|n| n.is_finite()) {
                let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
                entry.0 += number;
                entry.1 += 1;
            }
        }
    }

    let samples: Vec<NormalizedSample> = buckets
        .into_iter()
        .filter_map(|(start, sums)| {
            let timestamp = from_micros(start)?;
            let values: FieldMap = sums
                .into_iter()
                .map(|(name, (sum, count))| {
                    (name.to_string(), FieldValue::Number(sum / count as f64))
                })
                .collect();
            Some(NormalizedSample { timestamp, values })
        })
        .collect();

    stats.output = samples.len();
    Ok(Normalized {
        series: NormalizedSeries::sorted(samples, Some(width)),
        stats,
    })
}

/// Keeps every record at its own timestamp. Duplicate timestamps stay as
/// separate samples in their input order.
pub fn normalize_native(
    records: &[RawRecord],
    primary: &str,
    clock: &ReferenceClock,
) -> Normalized {
    let mut stats = NormalizeStats {
        input: records.len(),
        ..NormalizeStats::default()
    };
    let mut samples = Vec::with_capacity(records.len());

    for record in records {
        let Some(timestamp) = clock.parse(&record.timestamp_raw) else {
            stats.unparsable_timestamps += 1;
            continue;
        };
        if record.number(primary).is_none() {
            stats.missing_primary += 1;
            continue;
        }
        samples.push(NormalizedSample {
            timestamp,
            values: record.fields.clone(),
        });
    }

    samples.sort_by_key(|sample| sample.timestamp);
    stats.output = samples.len();

    Normalized {
        series: NormalizedSeries::sorted(samples, None),
        stats,
    }
}
