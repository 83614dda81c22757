use std::fmt;
use std::path::PathBuf;

use biofuse_parser::DecodeStats;
use chrono::NaiveDate;
use serde::Serialize;

use crate::normalizer::NormalizeStats;

/// Lifecycle of one calendar day within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    Discovered,
    Decoded,
    Normalized,
    Joined,
    Written,
    Skipped,
}

impl DayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayState::Discovered => "discovered",
            DayState::Decoded => "decoded",
            DayState::Normalized => "normalized",
            DayState::Joined => "joined",
            DayState::Written => "written",
            DayState::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DayState::Written | DayState::Skipped)
    }

    pub fn can_advance(&self, next: DayState) -> bool {
        use DayState::*;
        matches!(
            (self, next),
            (Discovered, Decoded)
                | (Decoded, Normalized)
                | (Normalized, Joined)
                | (Joined, Written)
                | (Discovered, Skipped)
                | (Decoded, Skipped)
                | (Normalized, Skipped)
        )
    }
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoAirInput,
    NoHeartRateInput,
    NoAirRecords,
    NoHeartRateRecords,
    EmptyAirSeries,
    EmptyHeartRateSeries,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoAirInput => "no air-quality file for this day",
            SkipReason::NoHeartRateInput => "no heart-rate file for this day",
            SkipReason::NoAirRecords => "air-quality files held no decodable records",
            SkipReason::NoHeartRateRecords => "heart-rate files held no decodable beats",
            SkipReason::EmptyAirSeries => "no air-quality record survived normalisation",
            SkipReason::EmptyHeartRateSeries => "no heart-rate beat survived normalisation",
        };
        f.write_str(text)
    }
}

/// Decode and normalise counters for one side of the join.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideReport {
    pub files: Vec<PathBuf>,
    pub decode: DecodeStats,
    pub normalize: NormalizeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub day: NaiveDate,
    pub primary_buckets: usize,
    pub secondary_samples: usize,
    pub fused_rows: usize,
    pub matched_rows: usize,
    pub bucket_width_secs: i64,
    pub tolerance_secs: i64,
    pub air: SideReport,
    pub heart_rate: SideReport,
    pub input_fingerprint: String,
    pub output_path: PathBuf,
    pub output_digest: String,
    pub flat_cache: Option<PathBuf>,
}

impl DayReport {
    /// Share of fused rows carrying a heart-rate match, in `0.0..=1.0`.
    pub fn match_rate(&self) -> f64 {
        if self.fused_rows == 0 {
            0.0
        } else {
            self.matched_rows as f64 / self.fused_rows as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayOutcome {
    Written(DayReport),
    Skipped {
        day: NaiveDate,
        stage: DayState,
        reason: SkipReason,
    },
    Failed {
        day: NaiveDate,
        stage: DayState,
        message: String,
    },
}

impl DayOutcome {
    pub fn day(&self) -> NaiveDate {
        match self {
            DayOutcome::Written(report) => report.day,
            DayOutcome::Skipped { day, .. } | DayOutcome::Failed { day, .. } => *day,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            DayOutcome::Written(_) => "written",
            DayOutcome::Skipped { .. } => "skipped",
            DayOutcome::Failed { .. } => "failed",
        }
    }

    pub fn report(&self) -> Option<&DayReport> {
        match self {
            DayOutcome::Written(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<DayOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|outcome| matches!(outcome, DayOutcome::Written(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, DayOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, DayOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, predicate: impl Fn(&DayOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_are_only_reachable_before_the_join() {
        assert!(DayState::Discovered.can_advance(DayState::Skipped));
        assert!(DayState::Decoded.can_advance(DayState::Skipped));
        assert!(DayState::Normalized.can_advance(DayState::Skipped));
        assert!(!DayState::Joined.can_advance(DayState::Skipped));
        assert!(!DayState::Discovered.can_advance(DayState::Joined));
        assert!(DayState::Written.is_terminal());
        assert!(!DayState::Joined.is_terminal());
    }

    #[test]
    fn outcomes_serialize_with_a_status_tag() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 29).unwrap();
        let outcome = DayOutcome::Skipped {
            day,
            stage: DayState::Decoded,
            reason: SkipReason::NoHeartRateRecords,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["stage"], "decoded");
        assert_eq!(json["reason"], "no_heart_rate_records");
        assert_eq!(json["day"], "2025-07-29");

        let batch = BatchReport {
            outcomes: vec![outcome],
        };
        assert_eq!(batch.skipped(), 1);
        assert!(!batch.has_failures());
    }
}
