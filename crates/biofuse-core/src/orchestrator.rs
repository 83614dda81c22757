use std::fs;
use std::path::Path;

use biofuse_parser::{decode_air_log, decode_heart_rate_file, Decoded};
use chrono::NaiveDate;
use tracing::{debug, error, info, info_span, warn};

use crate::config::FusionConfig;
use crate::discovery::{discover_days, discover_selected, DayInputs};
use crate::error::{PipelineError, Result};
use crate::joiner::join_nearest;
use crate::normalizer::{normalize_bucketed, normalize_native, Normalized};
use crate::outputs::{encode_frame, flat_cache_bytes, fused_dataframe, write_atomic};
use crate::report::{BatchReport, DayOutcome, DayReport, DayState, SideReport, SkipReason};
use crate::schema::{AIR_PRIMARY_FIELD, HEART_RATE_PRIMARY_FIELD};
use crate::timestamps::ReferenceClock;
use crate::types::FusedDayTable;

/// Drives decode, normalise, join and write for each calendar day.
///
/// Days are processed one at a time in ascending order. A day that skips or
/// fails never stops the days after it; the outcome of every day ends up in
/// the returned [`BatchReport`].
#[derive(Debug, Clone)]
pub struct DayBatch {
    config: FusionConfig,
    clock: ReferenceClock,
}

enum DayStep {
    Written(Box<DayReport>, FusedDayTable),
    Skipped(SkipReason),
}

struct DayRun {
    day: NaiveDate,
    state: DayState,
}

impl DayRun {
    fn new(day: NaiveDate) -> Self {
        Self {
            day,
            state: DayState::Discovered,
        }
    }

    fn advance(&mut self, next: DayState) {
        debug_assert!(self.state.can_advance(next), "{} -> {next}", self.state);
        debug!(from = %self.state, to = %next, "day state");
        self.state = next;
    }

    fn skip(self, reason: SkipReason) -> DayOutcome {
        debug_assert!(!self.state.is_terminal(), "{} is already settled", self.state);
        warn!(stage = %self.state, %reason, "skipping day");
        DayOutcome::Skipped {
            day: self.day,
            stage: self.state,
            reason,
        }
    }

    fn fail(self, err: PipelineError) -> DayOutcome {
        debug_assert!(!self.state.is_terminal(), "{} is already settled", self.state);
        error!(stage = %self.state, error = %err, "day failed");
        DayOutcome::Failed {
            day: self.day,
            stage: self.state,
            message: err.to_string(),
        }
    }
}

impl DayBatch {
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        let clock = config.reference_clock()?;
        Ok(Self { config, clock })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Every day with any input, or exactly `days` when it is non-empty.
    pub fn discover(&self, days: &[NaiveDate]) -> Result<Vec<DayInputs>> {
        if days.is_empty() {
            discover_days(&self.config)
        } else {
            discover_selected(&self.config, days)
        }
    }

    pub fn run(&self, days: &[NaiveDate]) -> Result<BatchReport> {
        let inputs = self.discover(days)?;
        Ok(self.run_each(&inputs, |_, _| {}))
    }

    /// Processes `inputs` in order, handing each outcome (and the fused table
    /// of written days) to `observe` before moving on.
    pub fn run_each<F>(&self, inputs: &[DayInputs], mut observe: F) -> BatchReport
    where
        F: FnMut(&DayOutcome, Option<&FusedDayTable>),
    {
        info!(
            days = inputs.len(),
            reference_zone = %self.clock.zone(),
            "starting batch"
        );
        let mut report = BatchReport::default();
        for day in inputs {
            let (outcome, table) = self.process_day(day);
            observe(&outcome, table.as_ref());
            report.outcomes.push(outcome);
        }
        info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            "batch finished"
        );
        report
    }

    pub fn process_day(&self, inputs: &DayInputs) -> (DayOutcome, Option<FusedDayTable>) {
        let span = info_span!("day", day = %inputs.day);
        let _guard = span.enter();

        let mut run = DayRun::new(inputs.day);
        match self.fuse_day(inputs, &mut run) {
            Ok(DayStep::Written(report, table)) => (DayOutcome::Written(*report), Some(table)),
            Ok(DayStep::Skipped(reason)) => (run.skip(reason), None),
            Err(err) => (run.fail(err), None),
        }
    }

    fn fuse_day(&self, inputs: &DayInputs, run: &mut DayRun) -> Result<DayStep> {
        let day = inputs.day;
        if !inputs.has_air() {
            return Ok(DayStep::Skipped(SkipReason::NoAirInput));
        }
        if !inputs.has_heart_rate() {
            return Ok(DayStep::Skipped(SkipReason::NoHeartRateInput));
        }

        let mut fingerprint = blake3::Hasher::new();
        let air_files = inputs.air_files.clone();
        let heart_rate_files = inputs.heart_rate_files().to_vec();

        let mut air = Decoded::new("AIR_LOG");
        for path in &air_files {
            let content = read_input(path, &mut fingerprint)?;
            let decoded = decode_air_log(&content);
            debug!(path = %path.display(), records = decoded.records.len(), "decoded air file");
            air.absorb(decoded);
        }

        let mut heart_rate = Decoded::new("HEART_RATE");
        for path in &heart_rate_files {
            let content = read_input(path, &mut fingerprint)?;
            match decode_heart_rate_file(&content) {
                Ok(decoded) => {
                    debug!(
                        path = %path.display(),
                        decoder = decoded.decoder,
                        records = decoded.records.len(),
                        "decoded heart-rate file"
                    );
                    heart_rate.absorb(decoded);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unreadable heart-rate file");
                    heart_rate.stats.skipped_lines += 1;
                }
            }
        }
        run.advance(DayState::Decoded);

        if air.is_empty() {
            return Ok(DayStep::Skipped(SkipReason::NoAirRecords));
        }
        if heart_rate.is_empty() {
            return Ok(DayStep::Skipped(SkipReason::NoHeartRateRecords));
        }

        let Normalized {
            series: air_series,
            stats: air_norm,
        } = normalize_bucketed(
            &air.records,
            AIR_PRIMARY_FIELD,
            self.config.bucket_width(),
            &self.clock,
        )?;
        let Normalized {
            series: hr_series,
            stats: hr_norm,
        } = normalize_native(&heart_rate.records, HEART_RATE_PRIMARY_FIELD, &self.clock);
        run.advance(DayState::Normalized);

        if air_series.is_empty() {
            return Ok(DayStep::Skipped(SkipReason::EmptyAirSeries));
        }
        if hr_series.is_empty() {
            return Ok(DayStep::Skipped(SkipReason::EmptyHeartRateSeries));
        }

        let flat_cache = if self.config.write_flat_cache && !inputs.health_files.is_empty() {
            let target = self.config.flat_path(day);
            match flat_cache_bytes(&hr_series).and_then(|bytes| write_atomic(&target, &bytes))
            {
                Ok(written) => Some(written.path),
                Err(err) => {
                    warn!(path = %target.display(), error = %err, "could not refresh flat heart-rate cache");
                    None
                }
            }
        } else {
            None
        };

        let table = join_nearest(day, &air_series, &hr_series, self.config.tolerance())?;
        run.advance(DayState::Joined);

        let df = fused_dataframe(&table)?;
        let bytes = encode_frame(&df, self.config.output_format)?;
        let persisted = write_atomic(&self.config.fused_path(day), &bytes)?;
        run.advance(DayState::Written);

        let report = DayReport {
            day,
            primary_buckets: air_series.len(),
            secondary_samples: hr_series.len(),
            fused_rows: table.len(),
            matched_rows: table.matched_rows(),
            bucket_width_secs: self.config.bucket_width_secs,
            tolerance_secs: self.config.tolerance_secs,
            air: SideReport {
                files: air_files,
                decode: air.stats,
                normalize: air_norm,
            },
            heart_rate: SideReport {
                files: heart_rate_files,
                decode: heart_rate.stats,
                normalize: hr_norm,
            },
            input_fingerprint: fingerprint.finalize().to_hex().to_string(),
            output_path: persisted.path,
            output_digest: persisted.digest,
            flat_cache,
        };

        info!(
            primary_buckets = report.primary_buckets,
            secondary_samples = report.secondary_samples,
            fused_rows = report.fused_rows,
            matched_rows = report.matched_rows,
            match_rate = report.match_rate(),
            path = %report.output_path.display(),
            "fused day written"
        );

        Ok(DayStep::Written(Box::new(report), table))
    }
}

/// Reads one input file, feeding its name and bytes into the day fingerprint.
/// Invalid UTF-8 is replaced rather than rejected.
fn read_input(path: &Path, fingerprint: &mut blake3::Hasher) -> Result<String> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    fingerprint.update(name.as_bytes());
    fingerprint.update(&(bytes.len() as u64).to_le_bytes());
    fingerprint.update(&bytes);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
