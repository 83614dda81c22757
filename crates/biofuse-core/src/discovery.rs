use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use glob::Pattern;
use serde::Serialize;
use tracing::debug;

use crate::config::FusionConfig;
use crate::error::Result;
use crate::timestamps::date_token;

/// Raw inputs found for one calendar day, each list sorted by file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayInputs {
    pub day: NaiveDate,
    pub air_files: Vec<PathBuf>,
    pub health_files: Vec<PathBuf>,
    pub flat_files: Vec<PathBuf>,
}

impl DayInputs {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            air_files: Vec::new(),
            health_files: Vec::new(),
            flat_files: Vec::new(),
        }
    }

    /// Raw archive rows win; the flattened cache is the fallback.
    pub fn heart_rate_files(&self) -> &[PathBuf] {
        if self.health_files.is_empty() {
            &self.flat_files
        } else {
            &self.health_files
        }
    }

    pub fn has_air(&self) -> bool {
        !self.air_files.is_empty()
    }

    pub fn has_heart_rate(&self) -> bool {
        !self.heart_rate_files().is_empty()
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Air,
    Health,
    Flat,
}

/// Groups every matching input file by the date token in its name. Files
/// without a valid `YYYY-MM-DD` token are ignored.
pub fn discover_days(config: &FusionConfig) -> Result<Vec<DayInputs>> {
    let sources = [
        (Slot::Air, &config.air_dir, &config.naming.air_prefix, "json"),
        (Slot::Health, &config.health_dir, &config.naming.health_prefix, "csv"),
        (Slot::Flat, &config.flat_dir, &config.naming.flat_prefix, "csv"),
    ];

    let mut days: BTreeMap<NaiveDate, DayInputs> = BTreeMap::new();
    for (slot, dir, prefix, extension) in sources {
        for path in matching_files(dir, prefix, extension)? {
            let Some(day) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(date_token)
            else {
                debug!(path = %path.display(), "no date token in file name; ignoring");
                continue;
            };
            let inputs = days.entry(day).or_insert_with(|| DayInputs::empty(day));
            match slot {
                Slot::Air => inputs.air_files.push(path),
                Slot::Health => inputs.health_files.push(path),
                Slot::Flat => inputs.flat_files.push(path),
            }
        }
    }

    Ok(days.into_values().collect())
}

/// Inputs for exactly `days`, in ascending order. Requested days without any
/// file still appear so the caller can report them as skipped.
pub fn discover_selected(config: &FusionConfig, days: &[NaiveDate]) -> Result<Vec<DayInputs>> {
    let mut found: BTreeMap<NaiveDate, DayInputs> = discover_days(config)?
        .into_iter()
        .map(|inputs| (inputs.day, inputs))
        .collect();

    let mut wanted = days.to_vec();
    wanted.sort_unstable();
    wanted.dedup();

    Ok(wanted
        .into_iter()
        .map(|day| found.remove(&day).unwrap_or_else(|| DayInputs::empty(day)))
        .collect())
}

fn matching_files(dir: &Path, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "input directory missing");
        return Ok(Vec::new());
    }
    let pattern = format!(
        "{}/{}*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(prefix),
        extension
    );
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
