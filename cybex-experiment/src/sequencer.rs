use std::time::Duration;

use log::{debug, info, warn};

use cybex_core::{build_schedule, PhaseKind, PhaseRecords, PhaseSpec, SequenceConfig};

use crate::adapter::{CompletionLatch, TaskRegistry};
use crate::display::Display;
use crate::markers::MarkerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerStatus {
    Running,
    Complete,
}

/// Collaborators the sequencer drives during a tick.
pub struct SequencerCtx<'a> {
    pub display: &'a mut dyn Display,
    pub markers: &'a mut MarkerQueue,
    pub tasks: &'a mut TaskRegistry,
}

/// Runtime bookkeeping for the phase currently in flight.
enum PhaseProgress {
    Timed { elapsed: Duration },
    Task { latch: CompletionLatch, elapsed: Duration },
}

/// Walks the fixed phase list, emitting Begin/End markers around every phase
/// and recording elapsed wall time under the phase's name.
///
/// Tick-driven: the owner calls [`tick`](Self::tick) once per frame. A phase
/// is entered on one tick and runs its body on subsequent ticks, so markers
/// for consecutive phases can never land out of order.
pub struct PhaseSequencer {
    schedule: Vec<PhaseSpec>,
    index: usize,
    progress: Option<PhaseProgress>,
    records: PhaseRecords,
}

impl PhaseSequencer {
    pub fn new(config: &SequenceConfig) -> Self {
        Self {
            schedule: build_schedule(config),
            index: 0,
            progress: None,
            records: PhaseRecords::new(),
        }
    }

    pub fn schedule(&self) -> &[PhaseSpec] {
        &self.schedule
    }

    pub fn records(&self) -> &PhaseRecords {
        &self.records
    }

    pub fn tick(&mut self, dt: Duration, ctx: &mut SequencerCtx) -> SequencerStatus {
        if self.index >= self.schedule.len() {
            return SequencerStatus::Complete;
        }
        let spec = self.schedule[self.index];

        match self.progress.take() {
            None => self.enter_phase(spec, ctx),
            Some(PhaseProgress::Timed { mut elapsed }) => {
                elapsed += dt;
                let PhaseKind::Timed { duration, .. } = spec.kind else {
                    unreachable!("timed progress on a task phase")
                };
                // The final report may go at or below zero; the phase ends
                // strictly at-or-after the configured duration.
                let remaining = duration.as_secs_f64() - elapsed.as_secs_f64();
                ctx.display.update_timer(&spec.display_label(), remaining);
                if elapsed >= duration {
                    ctx.display.hide_display();
                    self.finish_phase(spec, elapsed, ctx);
                } else {
                    self.progress = Some(PhaseProgress::Timed { elapsed });
                }
            }
            Some(PhaseProgress::Task { latch, mut elapsed }) => {
                elapsed += dt;
                let PhaseKind::TaskBound { task } = spec.kind else {
                    unreachable!("task progress on a timed phase")
                };
                if latch.is_set() {
                    if let Some(adapter) = ctx.tasks.get_mut(task) {
                        adapter.deactivate();
                    }
                    self.finish_phase(spec, elapsed, ctx);
                } else {
                    self.progress = Some(PhaseProgress::Task { latch, elapsed });
                }
            }
        }

        if self.index >= self.schedule.len() {
            SequencerStatus::Complete
        } else {
            SequencerStatus::Running
        }
    }

    /// Tears down an in-flight phase without emitting its End marker.
    /// Already-recorded durations stay as they are.
    pub fn abort(&mut self, tasks: &mut TaskRegistry) {
        if let Some(PhaseProgress::Task { .. }) = self.progress {
            if let PhaseKind::TaskBound { task } = self.schedule[self.index].kind {
                if let Some(adapter) = tasks.get_mut(task) {
                    adapter.deactivate();
                }
            }
        }
        if self.index < self.schedule.len() {
            info!(
                "sequence aborted during {} phase",
                self.schedule[self.index].label.name()
            );
        }
        self.progress = None;
        self.index = self.schedule.len();
    }

    fn enter_phase(&mut self, spec: PhaseSpec, ctx: &mut SequencerCtx) {
        ctx.markers.enqueue(spec.label.begin_marker());
        info!("phase {} started", spec.display_label());
        match spec.kind {
            PhaseKind::Timed { .. } => {
                ctx.display.show_prompt(&spec.display_label());
                self.progress = Some(PhaseProgress::Timed {
                    elapsed: Duration::ZERO,
                });
            }
            PhaseKind::TaskBound { task } => {
                // The task takes over the participant's view.
                ctx.display.hide_display();
                match ctx.tasks.get_mut(task) {
                    Some(adapter) => {
                        let (latch, handle) = CompletionLatch::new();
                        adapter.activate(handle);
                        self.progress = Some(PhaseProgress::Task {
                            latch,
                            elapsed: Duration::ZERO,
                        });
                    }
                    None => {
                        warn!(
                            "no adapter registered for {} task, resolving phase immediately",
                            spec.label.name()
                        );
                        self.finish_phase(spec, Duration::ZERO, ctx);
                    }
                }
            }
        }
    }

    fn finish_phase(&mut self, spec: PhaseSpec, elapsed: Duration, ctx: &mut SequencerCtx) {
        ctx.markers.enqueue(spec.label.end_marker());
        let secs = elapsed.as_secs_f64();
        if let Some(previous) = self.records.record(spec.label.name(), secs) {
            debug!(
                "{} duration re-recorded: {previous:.2}s overwritten by {secs:.2}s",
                spec.label.name()
            );
        }
        info!("phase {} finished after {:.2}s", spec.label.name(), secs);
        self.progress = None;
        self.index += 1;
    }
}
