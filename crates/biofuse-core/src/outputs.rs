use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::error::{PipelineError, Result};
use crate::schema::{
    ColumnKind, ColumnSpec, Side, FLAT_HEART_RATE_COLUMNS, FLAT_TIMESTAMP_FORMAT, FUSED_COLUMNS,
    TIMESTAMP, TIMESTAMP_FORMAT,
};
use crate::timestamps::to_micros;
use crate::types::{FieldValue, FusedDayTable, FusedRow, NormalizedSample, NormalizedSeries};

/// A row that can be laid out against a fixed column list.
pub trait TableRow {
    fn timestamp(&self) -> NaiveDateTime;
    fn cell(&self, column: &ColumnSpec) -> Option<&FieldValue>;
}

impl TableRow for FusedRow {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn cell(&self, column: &ColumnSpec) -> Option<&FieldValue> {
        match column.side {
            Side::Primary => self.primary.get(column.name),
            Side::Secondary => self.secondary.as_ref()?.get(column.name),
        }
    }
}

impl TableRow for NormalizedSample {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn cell(&self, column: &ColumnSpec) -> Option<&FieldValue> {
        self.values.get(column.name)
    }
}

fn text_cell(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(text) => Some(text.clone()),
        FieldValue::Number(number) => Some(number.to_string()),
        FieldValue::Null => None,
    }
}

/// Builds a frame with a microsecond `timestamp` column followed by `columns`.
/// Missing cells become nulls.
pub fn frame_from_rows<R: TableRow>(rows: &[R], columns: &[ColumnSpec]) -> Result<DataFrame> {
    let timestamps: Vec<i64> = rows.iter().map(|row| to_micros(row.timestamp())).collect();
    let ts_series = Series::new(TIMESTAMP.into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut cols: Vec<Column> = Vec::with_capacity(columns.len() + 1);
    cols.push(ts_series.into());

    for column in columns {
        match column.kind {
            ColumnKind::Float => {
                let values: Vec<Option<f64>> = rows
                    .iter()
                    .map(|row| row.cell(column).and_then(FieldValue::as_f64))
                    .collect();
                cols.push(Series::new(column.name.into(), values).into());
            }
            ColumnKind::Text => {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|row| row.cell(column).and_then(text_cell))
                    .collect();
                cols.push(Series::new(column.name.into(), values).into());
            }
        }
    }

    Ok(DataFrame::new(cols)?)
}

pub fn fused_dataframe(table: &FusedDayTable) -> Result<DataFrame> {
    frame_from_rows(&table.rows, &FUSED_COLUMNS)
}

pub fn flat_heart_rate_dataframe(series: &NormalizedSeries) -> Result<DataFrame> {
    frame_from_rows(series.samples(), &FLAT_HEART_RATE_COLUMNS)
}

/// CSV bytes of the flattened heart-rate cache, readable by the flat decoder.
pub fn flat_cache_bytes(series: &NormalizedSeries) -> Result<Vec<u8>> {
    let df = flat_heart_rate_dataframe(series)?;
    create_csv_bytes(&df, FLAT_TIMESTAMP_FORMAT)
}

pub fn encode_frame(df: &DataFrame, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => create_csv_bytes(df, TIMESTAMP_FORMAT),
        OutputFormat::Parquet => create_parquet_bytes(df),
    }
}

fn create_csv_bytes(df: &DataFrame, datetime_format: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut clone = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_datetime_format(Some(datetime_format.to_string()))
        .finish(&mut clone)?;
    Ok(buffer)
}

fn create_parquet_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut clone)?;
    }
    Ok(buffer)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedOutput {
    pub path: PathBuf,
    pub digest: String,
    pub bytes: usize,
}

pub fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Writes `bytes` to a temporary sibling of `target`, syncs it and renames it
/// over `target`. A failure leaves any previous `target` untouched.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<PersistedOutput> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".biofuse-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged
        .persist(target)
        .map_err(|err| PipelineError::Io(err.error))?;

    Ok(PersistedOutput {
        path: target.to_path_buf(),
        digest: digest(bytes),
        bytes: bytes.len(),
    })
}
