use chrono::{Duration, NaiveDate, NaiveDateTime};

pub use biofuse_parser::{FieldMap, FieldValue};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSample {
    pub timestamp: NaiveDateTime,
    pub values: FieldMap,
}

impl NormalizedSample {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            values: FieldMap::new(),
        }
    }

    pub fn with_value(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(FieldValue::as_f64)
    }
}

/// A time-ordered series for one signal and one day. Built once by the
/// normaliser and only read afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSeries {
    bucket_width: Option<Duration>,
    samples: Vec<NormalizedSample>,
}

impl NormalizedSeries {
    /// Wraps samples that are already in ascending time order.
    pub fn from_samples(
        samples: Vec<NormalizedSample>,
        bucket_width: Option<Duration>,
    ) -> Result<Self> {
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(PipelineError::Validation(format!(
                "series out of order: {} follows {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }
        Ok(Self {
            bucket_width,
            samples,
        })
    }

    pub(crate) fn sorted(samples: Vec<NormalizedSample>, bucket_width: Option<Duration>) -> Self {
        Self {
            bucket_width,
            samples,
        }
    }

    pub fn samples(&self) -> &[NormalizedSample] {
        &self.samples
    }

    pub fn bucket_width(&self) -> Option<Duration> {
        self.bucket_width
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One output row per primary timestamp. `secondary` is `None` when nothing
/// fell inside the tolerance window.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedRow {
    pub timestamp: NaiveDateTime,
    pub primary: FieldMap,
    pub secondary: Option<FieldMap>,
    pub matched_at: Option<NaiveDateTime>,
}

impl FusedRow {
    pub fn is_matched(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn secondary_number(&self, name: &str) -> Option<f64> {
        self.secondary
            .as_ref()
            .and_then(|values| values.get(name))
            .and_then(FieldValue::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusedDayTable {
    pub day: NaiveDate,
    pub rows: Vec<FusedRow>,
}

impl FusedDayTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn matched_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.is_matched()).count()
    }
}
