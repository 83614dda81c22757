use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use biofuse_core::outputs::TableRow;
use biofuse_core::schema::{fused_header, FUSED_COLUMNS, TIMESTAMP_FORMAT};
use biofuse_core::types::{FusedDayTable, FusedRow};
use biofuse_core::{BatchReport, DayBatch, DayOutcome, FusionConfig, OutputFormat};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use tracing::info;

use super::{render_value, summary_table};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Parquet,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Only process this day (repeatable); every discovered day otherwise.
    #[arg(long = "day", value_name = "YYYY-MM-DD")]
    days: Vec<NaiveDate>,

    #[arg(long)]
    air_dir: Option<PathBuf>,

    #[arg(long)]
    health_dir: Option<PathBuf>,

    #[arg(long)]
    fused_dir: Option<PathBuf>,

    /// Width of the CO₂ aggregation buckets.
    #[arg(long)]
    bucket_secs: Option<i64>,

    /// Largest accepted distance between a bucket and its heart-rate match.
    #[arg(long)]
    tolerance_secs: Option<i64>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Do not refresh the flattened heart-rate cache.
    #[arg(long)]
    no_flat_cache: bool,

    /// Print the first N fused rows and the first N matched rows of each day.
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// Write the full batch report as JSON.
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, mut config: FusionConfig) -> FusionConfig {
        if let Some(dir) = &self.air_dir {
            config.air_dir = dir.clone();
        }
        if let Some(dir) = &self.health_dir {
            config.health_dir = dir.clone();
        }
        if let Some(dir) = &self.fused_dir {
            config.fused_dir = dir.clone();
        }
        if let Some(secs) = self.bucket_secs {
            config.bucket_width_secs = secs;
        }
        if let Some(secs) = self.tolerance_secs {
            config.tolerance_secs = secs;
        }
        if let Some(format) = self.format {
            config.output_format = format.into();
        }
        if self.no_flat_cache {
            config.write_flat_cache = false;
        }
        config
    }

    /// Applies the flags, then expands `~` in file and flag directories alike.
    fn resolve(&self, config: FusionConfig) -> FusionConfig {
        self.apply(config).expand_home()
    }
}

pub fn handle_run_command(config: FusionConfig, args: RunArgs) -> Result<()> {
    let config = args.resolve(config);
    let batch = DayBatch::new(config).context("invalid configuration")?;
    let inputs = batch
        .discover(&args.days)
        .context("failed to discover input files")?;

    if inputs.is_empty() {
        info!(
            air_dir = %batch.config().air_dir.display(),
            health_dir = %batch.config().health_dir.display(),
            "no input days found"
        );
    }

    let report = batch.run_each(&inputs, |_, table| {
        if let (Some(limit), Some(table)) = (args.preview, table) {
            print_preview(table, limit);
        }
    });

    print_summary(&report);

    if let Some(path) = &args.report_json {
        let json = serde_json::to_vec_pretty(&report).context("failed to serialise report")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if report.has_failures() {
        bail!("{} of {} day(s) failed", report.failed(), report.outcomes.len());
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let mut table = summary_table(&[
        "Day", "Status", "Buckets", "Beats", "Rows", "Matched", "Match %", "Detail",
    ]);
    for outcome in &report.outcomes {
        let row = match outcome {
            DayOutcome::Written(day) => vec![
                day.day.to_string(),
                outcome.status().to_string(),
                day.primary_buckets.to_string(),
                day.secondary_samples.to_string(),
                day.fused_rows.to_string(),
                day.matched_rows.to_string(),
                format!("{:.1}", day.match_rate() * 100.0),
                day.output_path.display().to_string(),
            ],
            DayOutcome::Skipped { day, stage, reason } => vec![
                day.to_string(),
                outcome.status().to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                format!("at {stage}: {reason}"),
            ],
            DayOutcome::Failed {
                day,
                stage,
                message,
            } => vec![
                day.to_string(),
                outcome.status().to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                format!("at {stage}: {message}"),
            ],
        };
        table.add_row(row);
    }

    println!("{table}");
    println!(
        "{} written, {} skipped, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    );
}

fn print_preview(table: &FusedDayTable, limit: usize) {
    println!("\n{} (first {limit} rows)", table.day);
    println!("{}", rows_table(table.rows.iter().take(limit)));

    println!("{} (first {limit} rows with a heart-rate match)", table.day);
    println!(
        "{}",
        rows_table(table.rows.iter().filter(|row| row.is_matched()).take(limit))
    );
}

fn rows_table<'a>(rows: impl Iterator<Item = &'a FusedRow>) -> comfy_table::Table {
    let mut table = summary_table(&fused_header());
    for row in rows {
        let mut cells = vec![row.timestamp.format(TIMESTAMP_FORMAT).to_string()];
        cells.extend(
            FUSED_COLUMNS
                .iter()
                .map(|column| render_value(row.cell(column))),
        );
        table.add_row(cells);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    #[test]
    fn flags_override_file_values() {
        let harness = Harness::parse_from([
            "biofuse",
            "--day",
            "2025-07-28",
            "--day",
            "2025-07-29",
            "--tolerance-secs",
            "90",
            "--format",
            "parquet",
            "--no-flat-cache",
        ]);
        let config = harness.run.apply(FusionConfig::default());

        assert_eq!(harness.run.days.len(), 2);
        assert_eq!(config.tolerance_secs, 90);
        assert_eq!(config.bucket_width_secs, 60);
        assert_eq!(config.output_format, OutputFormat::Parquet);
        assert!(!config.write_flat_cache);
    }

    #[test]
    fn flag_directories_expand_home() {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let harness = Harness::parse_from(["biofuse", "--air-dir", "~/sensors/co2"]);
        let config = harness.run.resolve(FusionConfig::default());

        assert_eq!(config.air_dir, PathBuf::from(&home).join("sensors/co2"));
        assert_eq!(config.health_dir, PathBuf::from(&home).join("biologger/data/raw"));
    }
}
