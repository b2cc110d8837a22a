pub mod adapter;
pub mod controller;
pub mod display;
pub mod markers;
pub mod sequencer;
pub mod sickness;

pub use adapter::{CompletionHandle, CompletionLatch, TaskAdapter, TaskRegistry};
pub use controller::{CompletionObserver, ExperimentController, InputSnapshot};
pub use display::{Display, NullDisplay};
pub use markers::{MarkerQueue, MarkerSink, NullMarkerSink};
pub use sequencer::{PhaseSequencer, SequencerCtx, SequencerStatus};
pub use sickness::{SicknessReporter, DEFAULT_COOLDOWN};
