use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// Descend into an object member.
    Key(&'static str),
    /// Fan out over the elements of an array.
    Each,
    /// Keep only objects whose `key` is the string `value`.
    WhereEq {
        key: &'static str,
        value: &'static str,
    },
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => write!(f, "{key}"),
            PathStep::Each => f.write_str("[*]"),
            PathStep::WhereEq { key, value } => write!(f, "[{key} == {value:?}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    MissingKey(&'static str),
    NotAnArray,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::MissingKey(key) => write!(f, "no member '{key}'"),
            MissReason::NotAnArray => f.write_str("value is not an array"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step {step} ({at}) not found: {reason}")]
pub struct PathMiss {
    pub step: usize,
    pub at: PathStep,
    pub reason: MissReason,
}

/// An ordered descriptor into a loosely typed payload. Fan-out steps make the
/// walk produce every matching value; elements that do not fit a step are
/// dropped individually, and the walk only misses when a step leaves nothing
/// out of a non-empty input.
#[derive(Debug, Clone, Copy)]
pub struct SchemaPath {
    steps: &'static [PathStep],
}

/// `data → metrics → [*] → where name == "heart_rate" → data → [*]`
pub const HEART_RATE_PATH: SchemaPath = SchemaPath::new(&[
    PathStep::Key("data"),
    PathStep::Key("metrics"),
    PathStep::Each,
    PathStep::WhereEq {
        key: "name",
        value: "heart_rate",
    },
    PathStep::Key("data"),
    PathStep::Each,
]);

/// Payloads archived without the outer `data` wrapper.
pub const UNWRAPPED_HEART_RATE_PATH: SchemaPath = SchemaPath::new(&[
    PathStep::Key("metrics"),
    PathStep::Each,
    PathStep::WhereEq {
        key: "name",
        value: "heart_rate",
    },
    PathStep::Key("data"),
    PathStep::Each,
]);

impl SchemaPath {
    pub const fn new(steps: &'static [PathStep]) -> Self {
        Self { steps }
    }

    pub fn walk<'v>(&self, root: &'v Value) -> Result<Vec<&'v Value>, PathMiss> {
        let mut current = vec![root];

        for (step_idx, step) in self.steps.iter().enumerate() {
            if current.is_empty() {
                break;
            }

            let next: Vec<&Value> = match step {
                PathStep::Key(key) => current
                    .iter()
                    .copied()
                    .filter_map(|value| value.as_object().and_then(|obj| obj.get(*key)))
                    .collect(),
                PathStep::Each => current
                    .iter()
                    .copied()
                    .filter_map(|value| value.as_array())
                    .flatten()
                    .collect(),
                PathStep::WhereEq { key, value } => current
                    .iter()
                    .copied()
                    .filter(|candidate| {
                        candidate.get(*key).and_then(Value::as_str) == Some(*value)
                    })
                    .collect(),
            };

            if next.is_empty() {
                let reason = match step {
                    PathStep::Key(key) => Some(MissReason::MissingKey(*key)),
                    PathStep::Each if !current.iter().any(|value| value.is_array()) => {
                        Some(MissReason::NotAnArray)
                    }
                    _ => None,
                };
                if let Some(reason) = reason {
                    return Err(PathMiss {
                        step: step_idx,
                        at: *step,
                        reason,
                    });
                }
            }

            current = next;
        }

        Ok(current)
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 {
                f.write_str(" → ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_to_heart_rate_entries_only() {
        let payload = json!({"data": {"metrics": [
            {"name": "step_count", "data": [{"qty": 10}]},
            {"name": "heart_rate", "data": [{"Avg": 70}, {"Avg": 72}]},
        ]}});
        let beats = HEART_RATE_PATH.walk(&payload).unwrap();
        assert_eq!(beats.len(), 2);
        assert_eq!(beats[1]["Avg"], 72);
    }

    #[test]
    fn missing_key_reports_the_step() {
        let payload = json!({"metrics": []});
        let miss = HEART_RATE_PATH.walk(&payload).unwrap_err();
        assert_eq!(miss.step, 0);
        assert_eq!(miss.reason, MissReason::MissingKey("data"));
        assert!(UNWRAPPED_HEART_RATE_PATH.walk(&payload).unwrap().is_empty());
    }

    #[test]
    fn non_array_metrics_is_a_miss() {
        let payload = json!({"metrics": {"name": "heart_rate"}});
        let miss = UNWRAPPED_HEART_RATE_PATH.walk(&payload).unwrap_err();
        assert_eq!(miss.step, 1);
        assert_eq!(miss.reason, MissReason::NotAnArray);
    }
}
