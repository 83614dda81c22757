use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use biofuse_parser::{decode_air_log, decode_heart_rate_file, SignalKind};
use clap::Args;

use super::{render_value, summary_table};

#[derive(Args, Debug)]
pub struct DecodeArgs {
    file: PathBuf,

    /// Which stream the file belongs to: `air` or `health`.
    #[arg(long, value_parser = parse_kind)]
    kind: SignalKind,

    /// Records to print after the stats.
    #[arg(long, default_value_t = 5)]
    show: usize,
}

fn parse_kind(value: &str) -> Result<SignalKind, String> {
    SignalKind::try_from(value)
}

pub fn handle_decode_command(args: DecodeArgs) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    let decoded = match args.kind {
        SignalKind::Air => decode_air_log(&content),
        SignalKind::HeartRate => decode_heart_rate_file(&content)
            .with_context(|| format!("no decoder accepted {}", args.file.display()))?,
    };

    let mut stats = summary_table(&["Decoder", "Decoded", "Skipped lines", "Missing fields"]);
    stats.add_row(vec![
        decoded.decoder.to_string(),
        decoded.stats.decoded.to_string(),
        decoded.stats.skipped_lines.to_string(),
        decoded.stats.missing_fields.to_string(),
    ]);
    println!("{stats}");

    if args.show == 0 || decoded.is_empty() {
        return Ok(());
    }

    let mut names: Vec<&str> = decoded
        .records
        .iter()
        .flat_map(|record| record.fields.keys().map(String::as_str))
        .collect();
    names.sort_unstable();
    names.dedup();

    let header: Vec<&str> = std::iter::once("timestamp_raw").chain(names.iter().copied()).collect();
    let mut records = summary_table(&header);
    for record in decoded.records.iter().take(args.show) {
        let mut cells = vec![record.timestamp_raw.clone()];
        cells.extend(names.iter().map(|name| render_value(record.field(name))));
        records.add_row(cells);
    }
    println!("{records}");
    Ok(())
}
