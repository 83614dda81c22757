use std::fmt;

use thiserror::Error;

use crate::model::SignalKind;

/// One layout that looked at an input and declined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRejection {
    pub decoder: &'static str,
    pub reason: String,
}

impl fmt::Display for LayoutRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.decoder, self.reason)
    }
}

fn list_rejections(rejections: &[LayoutRejection]) -> String {
    if rejections.is_empty() {
        return "no layout registered".to_string();
    }
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures that concern a whole input unit. Problems with single lines or
/// rows never surface here; they are counted in [`crate::DecodeStats`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("input is not {decoder} data: {reason}")]
    FormatMismatch {
        decoder: &'static str,
        reason: String,
    },

    #[error("{decoder} could not read the CSV header: {source}")]
    Csv {
        decoder: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("no {signal} layout fits this input: {}", list_rejections(.rejections))]
    UnrecognisedLayout {
        signal: SignalKind,
        rejections: Vec<LayoutRejection>,
    },
}
