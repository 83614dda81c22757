pub mod config;
pub mod discovery;
pub mod error;
pub mod joiner;
pub mod normalizer;
pub mod orchestrator;
pub mod outputs;
pub mod report;
pub mod schema;
pub mod timestamps;
pub mod types;

pub use config::{FusionConfig, NamingConfig, OutputFormat};
pub use error::{PipelineError, Result};
pub use orchestrator::DayBatch;
pub use report::{BatchReport, DayOutcome, DayReport, DayState, SkipReason};
