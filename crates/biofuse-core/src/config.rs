use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::timestamps::ReferenceClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// File name prefixes; the calendar day follows the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub air_prefix: String,
    pub health_prefix: String,
    pub flat_prefix: String,
    pub fused_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            air_prefix: "co2_".to_string(),
            health_prefix: "bio_".to_string(),
            flat_prefix: "hr_".to_string(),
            fused_prefix: "fused_".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionConfig {
    pub air_dir: PathBuf,
    pub health_dir: PathBuf,
    pub flat_dir: PathBuf,
    pub fused_dir: PathBuf,
    pub bucket_width_secs: i64,
    pub tolerance_secs: i64,
    /// IANA name of the canonical clock, e.g. `UTC` or `America/Los_Angeles`.
    pub reference_zone: String,
    pub output_format: OutputFormat,
    pub write_flat_cache: bool,
    pub naming: NamingConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            air_dir: PathBuf::from("~/data/co2"),
            health_dir: PathBuf::from("~/biologger/data/raw"),
            flat_dir: PathBuf::from("~/biologger/data/flat"),
            fused_dir: PathBuf::from("~/biologger/data/fused"),
            bucket_width_secs: 60,
            tolerance_secs: 180,
            reference_zone: "UTC".to_string(),
            output_format: OutputFormat::Csv,
            write_flat_cache: true,
            naming: NamingConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str::<FusionConfig>(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Replaces a leading `~` in every directory with `$HOME`.
    pub fn expand_home(mut self) -> Self {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            for dir in [
                &mut self.air_dir,
                &mut self.health_dir,
                &mut self.flat_dir,
                &mut self.fused_dir,
            ] {
                if let Ok(rest) = dir.strip_prefix("~") {
                    *dir = home.join(rest);
                }
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_width_secs <= 0 {
            return Err(PipelineError::Config(format!(
                "bucket_width_secs must be positive, got {}",
                self.bucket_width_secs
            )));
        }
        if self.tolerance_secs < 0 {
            return Err(PipelineError::Config(format!(
                "tolerance_secs must not be negative, got {}",
                self.tolerance_secs
            )));
        }
        microsecond_span("bucket_width_secs", self.bucket_width_secs)?;
        microsecond_span("tolerance_secs", self.tolerance_secs)?;
        self.reference_clock()?;
        Ok(())
    }

    /// Saturates instead of panicking; `validate` rejects widths this large.
    pub fn bucket_width(&self) -> Duration {
        Duration::try_seconds(self.bucket_width_secs).unwrap_or(Duration::MAX)
    }

    /// Saturates instead of panicking; `validate` rejects tolerances this large.
    pub fn tolerance(&self) -> Duration {
        Duration::try_seconds(self.tolerance_secs).unwrap_or(Duration::MAX)
    }

    pub fn reference_clock(&self) -> Result<ReferenceClock> {
        let zone: Tz = self.reference_zone.trim().parse().map_err(|err| {
            PipelineError::Config(format!(
                "unknown reference_zone '{}': {err}",
                self.reference_zone
            ))
        })?;
        Ok(ReferenceClock::new(zone))
    }

    pub fn fused_path(&self, day: NaiveDate) -> PathBuf {
        self.fused_dir.join(format!(
            "{}{}.{}",
            self.naming.fused_prefix,
            day.format("%Y-%m-%d"),
            self.output_format.extension()
        ))
    }

    pub fn flat_path(&self, day: NaiveDate) -> PathBuf {
        self.flat_dir
            .join(format!("{}{}.csv", self.naming.flat_prefix, day.format("%Y-%m-%d")))
    }
}

/// Series arithmetic runs on microsecond counts, so every configured span
/// must fit in an `i64` of microseconds.
fn microsecond_span(name: &str, secs: i64) -> Result<Duration> {
    Duration::try_seconds(secs)
        .filter(|span| span.num_microseconds().is_some())
        .ok_or_else(|| {
            PipelineError::Config(format!(
                "{name} is too large to count in microseconds, got {secs}"
            ))
        })
}
