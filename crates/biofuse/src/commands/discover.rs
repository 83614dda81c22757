use std::path::PathBuf;

use anyhow::{Context, Result};
use biofuse_core::discovery::discover_days;
use biofuse_core::FusionConfig;

use super::summary_table;

fn file_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn handle_discover_command(config: &FusionConfig) -> Result<()> {
    let days = discover_days(config).context("failed to discover input files")?;

    let mut table = summary_table(&["Day", "Air files", "Heart-rate files", "Output"]);
    for inputs in &days {
        let heart_rate = if inputs.health_files.is_empty() && !inputs.flat_files.is_empty() {
            format!("{}\n(flat cache)", file_names(&inputs.flat_files))
        } else {
            file_names(&inputs.health_files)
        };
        let target = config.fused_path(inputs.day);
        let output = if target.exists() {
            format!("{} (exists)", target.display())
        } else {
            target.display().to_string()
        };
        table.add_row(vec![
            inputs.day.to_string(),
            file_names(&inputs.air_files),
            heart_rate,
            output,
        ]);
    }

    println!("{table}");
    println!("{} day(s) discovered", days.len());
    Ok(())
}
