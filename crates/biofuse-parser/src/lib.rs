pub mod errors;
pub mod formats;
pub mod literal;
pub mod model;
pub mod path;
mod registry;

pub use errors::{DecodeError, LayoutRejection};
pub use formats::{AirLogDecoder, FlatHeartRateDecoder, HealthArchiveDecoder};
pub use model::{DecodeStats, Decoded, FieldMap, FieldValue, RawRecord, SignalKind};
pub use registry::{decode_air_log, decode_as, decode_heart_rate_file, SignalDecoder};
