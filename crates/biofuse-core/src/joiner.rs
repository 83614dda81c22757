use chrono::{Duration, NaiveDate};

use crate::error::{PipelineError, Result};
use crate::timestamps::to_micros;
use crate::types::{FusedDayTable, FusedRow, NormalizedSeries};

/// Left-joins `secondary` onto every `primary` sample by nearest timestamp.
///
/// For each primary instant `t` the two candidates are the last secondary
/// sample at or before `t` and the first one after `t`. The closer candidate
/// wins, and an exact tie goes to the earlier one. The match is kept when
/// `|Δ| <= tolerance`; otherwise the row carries no secondary values.
///
/// Both series are sorted, so a single forward sweep suffices.
pub fn join_nearest(
    day: NaiveDate,
    primary: &NormalizedSeries,
    secondary: &NormalizedSeries,
    tolerance: Duration,
) -> Result<FusedDayTable> {
    let tolerance_us = match tolerance.num_microseconds() {
        Some(micros) if micros >= 0 => micros,
        Some(_) => {
            return Err(PipelineError::Validation(format!(
                "tolerance must be non-negative, got {tolerance}"
            )))
        }
        None => {
            return Err(PipelineError::Validation(format!(
                "tolerance {tolerance} does not fit in microseconds"
            )))
        }
    };

    let candidates = secondary.samples();
    let candidate_times: Vec<i64> = candidates
        .iter()
        .map(|sample| to_micros(sample.timestamp))
        .collect();

    let mut rows = Vec::with_capacity(primary.len());
    // First candidate strictly after the current primary instant.
    let mut upper = 0usize;

    for sample in primary.samples() {
        let t = to_micros(sample.timestamp);
        while upper < candidate_times.len() && candidate_times[upper] <= t {
            upper += 1;
        }

        let before = upper.checked_sub(1);
        let after = (upper < candidate_times.len()).then_some(upper);
        let nearest = match (before, after) {
            (Some(b), Some(a)) => {
                if t - candidate_times[b] <= candidate_times[a] - t {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        };

        let matched = nearest.filter(|idx| (candidate_times[*idx] - t).abs() <= tolerance_us);

        rows.push(FusedRow {
            timestamp: sample.timestamp,
            primary: sample.values.clone(),
            secondary: matched.map(|idx| candidates[idx].values.clone()),
            matched_at: matched.map(|idx| candidates[idx].timestamp),
        });
    }

    Ok(FusedDayTable { day, rows })
}
