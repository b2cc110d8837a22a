pub mod config;
pub mod marker;
pub mod phase;
pub mod record;

pub use config::SequenceConfig;
pub use marker::Marker;
pub use phase::{build_schedule, ExperimentState, PhaseKind, PhaseLabel, PhaseSpec, TaskKind};
pub use record::PhaseRecords;
