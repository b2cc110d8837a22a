use std::time::Duration;

use log::{info, warn};

use cybex_core::{ExperimentState, Marker, PhaseRecords, SequenceConfig};

use crate::adapter::{TaskAdapter, TaskRegistry};
use crate::display::{Display, NullDisplay};
use crate::markers::{MarkerQueue, MarkerSink, NullMarkerSink};
use crate::sequencer::{PhaseSequencer, SequencerCtx, SequencerStatus};
use crate::sickness::SicknessReporter;

/// Per-tick snapshot of the edge-clean external triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pub start: bool,
    pub confirm: bool,
    pub sickness: bool,
}

pub type CompletionObserver = Box<dyn FnMut(&PhaseRecords)>;

/// Owns the run: configuration, lifecycle state, the sequencer, marker
/// plumbing and the sickness reporter; aggregates recorded durations.
///
/// Collaborators are injected before the run starts; anything left unset
/// degrades to a warned no-op rather than failing the session.
pub struct ExperimentController {
    config: SequenceConfig,
    state: ExperimentState,
    sequencer: Option<PhaseSequencer>,
    markers: MarkerQueue,
    sickness: SicknessReporter,
    display: Box<dyn Display>,
    sink: Box<dyn MarkerSink>,
    tasks: TaskRegistry,
    idle_records: PhaseRecords,
    on_complete: Option<CompletionObserver>,
    halted: bool,
}

impl ExperimentController {
    pub fn new(config: SequenceConfig) -> Self {
        Self {
            config,
            state: ExperimentState::NotStarted,
            sequencer: None,
            markers: MarkerQueue::new(),
            sickness: SicknessReporter::new(),
            display: Box::new(NullDisplay),
            sink: Box::new(NullMarkerSink),
            tasks: TaskRegistry::new(),
            idle_records: PhaseRecords::new(),
            on_complete: None,
            halted: false,
        }
    }

    pub fn set_display(&mut self, display: Box<dyn Display>) {
        self.display = display;
    }

    pub fn set_marker_sink(&mut self, sink: Box<dyn MarkerSink>) {
        self.sink = sink;
    }

    pub fn set_sickness_reporter(&mut self, reporter: SicknessReporter) {
        self.sickness = reporter;
    }

    pub fn register_task(&mut self, task: cybex_core::TaskKind, adapter: Box<dyn TaskAdapter>) {
        self.tasks.register(task, adapter);
    }

    /// Registers the observer fired exactly once on completion.
    pub fn on_complete(&mut self, observer: CompletionObserver) {
        self.on_complete = Some(observer);
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn sickness_ack_visible(&self) -> bool {
        self.sickness.ack_visible()
    }

    /// Markers still waiting for a drain slot.
    pub fn pending_markers(&self) -> usize {
        self.markers.len()
    }

    /// Begins the run. A repeated start is reported and ignored.
    pub fn start_experiment(&mut self) {
        if self.state != ExperimentState::NotStarted {
            warn!("start requested but experiment already started ({:?})", self.state);
            return;
        }
        self.report_config_gaps();
        let sequencer = PhaseSequencer::new(&self.config);
        info!("experiment started, {} phases scheduled", sequencer.schedule().len());
        self.markers.enqueue(Marker::Start);
        self.sequencer = Some(sequencer);
        self.state = ExperimentState::Running;
    }

    /// Programmatic sickness report, independent of lifecycle state.
    pub fn force_sickness_marker(&mut self) {
        self.sickness.force_report(&mut self.markers);
    }

    /// Enqueues a marker by external name; unknown names are warned and
    /// dropped without disturbing the queue.
    pub fn push_marker_named(&mut self, name: &str) -> bool {
        self.markers.enqueue_named(name)
    }

    pub fn task_duration(&self, name: &str) -> Option<f64> {
        self.records().duration(name)
    }

    pub fn all_task_durations(&self) -> &PhaseRecords {
        self.records()
    }

    /// Advances the run by one frame. Always ticks the sickness reporter and
    /// drains one marker, whatever the lifecycle state.
    pub fn tick(&mut self, dt: Duration, input: InputSnapshot) -> ExperimentState {
        if self.halted {
            // Torn down: keep draining so nothing new is synthesized.
            self.markers.drain_one(self.sink.as_mut());
            return self.state;
        }
        match self.state {
            ExperimentState::NotStarted => {
                if input.start {
                    self.start_experiment();
                }
            }
            ExperimentState::Running => {
                if let Some(sequencer) = &mut self.sequencer {
                    let mut ctx = SequencerCtx {
                        display: self.display.as_mut(),
                        markers: &mut self.markers,
                        tasks: &mut self.tasks,
                    };
                    if sequencer.tick(dt, &mut ctx) == SequencerStatus::Complete {
                        self.markers.enqueue(Marker::End);
                        self.display
                            .show_prompt("Protocol complete. Awaiting confirmation.");
                        self.state = ExperimentState::AwaitingExit;
                        info!("sequence complete, awaiting exit confirmation");
                    }
                } else {
                    warn!("running without a sequencer, forcing completion");
                    self.state = ExperimentState::AwaitingExit;
                }
            }
            ExperimentState::AwaitingExit => {
                if input.confirm {
                    self.finish();
                }
            }
            ExperimentState::Completed => {}
        }

        self.sickness.tick(dt, input.sickness, &mut self.markers);
        self.markers.drain_one(self.sink.as_mut());
        self.state
    }

    /// The only cancellation path: halts in-flight phases without their End
    /// markers; already-recorded durations stay queryable.
    pub fn shutdown(&mut self) {
        self.halted = true;
        if let Some(sequencer) = &mut self.sequencer {
            sequencer.abort(&mut self.tasks);
        }
        self.display.hide_display();
        info!("experiment shut down, partial records retained");
    }

    fn finish(&mut self) {
        self.state = ExperimentState::Completed;
        self.display.hide_display();
        info!("experiment completed:\n{}", self.records().summary());
        if let Some(mut observer) = self.on_complete.take() {
            let records = match &self.sequencer {
                Some(sequencer) => sequencer.records(),
                None => &self.idle_records,
            };
            observer(records);
        }
    }

    fn records(&self) -> &PhaseRecords {
        match &self.sequencer {
            Some(sequencer) => sequencer.records(),
            None => &self.idle_records,
        }
    }

    fn report_config_gaps(&self) {
        if self.config.mindfulness_secs <= 0.0 {
            warn!("mindfulness duration is non-positive, phase will end immediately");
        }
        let enabled = self.config.enabled_tasks();
        if enabled.is_empty() {
            warn!("all tasks disabled, protocol is mindfulness only");
        } else if self.config.rest_secs <= 0.0 {
            warn!("rest duration is non-positive, rest phases will end immediately");
        }
        for task in enabled {
            if !self.tasks.is_registered(task) {
                warn!(
                    "{} task enabled but no adapter registered, its phase will resolve immediately",
                    task.name()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CompletionHandle;
    use cybex_core::TaskKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    const TICK: Duration = Duration::from_millis(100);

    #[derive(Default)]
    struct SharedSink {
        names: Rc<RefCell<Vec<String>>>,
    }

    impl MarkerSink for SharedSink {
        fn push_marker(&mut self, name: &str) {
            self.names.borrow_mut().push(name.to_string());
        }
    }

    type Slot = Rc<RefCell<Option<CompletionHandle>>>;

    struct SlotTask {
        slot: Slot,
    }

    impl TaskAdapter for SlotTask {
        fn activate(&mut self, done: CompletionHandle) {
            *self.slot.borrow_mut() = Some(done);
        }

        fn deactivate(&mut self) {
            *self.slot.borrow_mut() = None;
        }
    }

    fn controller(config: SequenceConfig) -> (ExperimentController, Rc<RefCell<Vec<String>>>) {
        let names = Rc::new(RefCell::new(Vec::new()));
        let mut controller = ExperimentController::new(config);
        controller.set_marker_sink(Box::new(SharedSink {
            names: Rc::clone(&names),
        }));
        (controller, names)
    }

    fn visit_only_config() -> SequenceConfig {
        SequenceConfig {
            mindfulness_secs: 1.0,
            rest_secs: 0.5,
            enable_visit: true,
            enable_select: false,
            enable_manipulation: false,
        }
    }

    fn tick_until(
        controller: &mut ExperimentController,
        input: impl Fn(usize) -> InputSnapshot,
        stop: impl Fn(&ExperimentController) -> bool,
    ) {
        for i in 0..2000 {
            controller.tick(TICK, input(i));
            if stop(controller) {
                return;
            }
        }
        panic!("condition not reached within the tick budget");
    }

    #[test]
    fn start_is_idempotent() {
        let (mut controller, _names) = controller(visit_only_config());
        controller.start_experiment();
        controller.start_experiment();
        assert_eq!(controller.state(), ExperimentState::Running);
        // Exactly one Start marker was enqueued.
        assert_eq!(controller.pending_markers(), 1);
    }

    #[test]
    fn visit_only_run_emits_the_expected_marker_sequence() {
        let (mut controller, names) = controller(visit_only_config());
        let slot: Slot = Rc::new(RefCell::new(None));
        controller.register_task(
            TaskKind::Visit,
            Box::new(SlotTask {
                slot: Rc::clone(&slot),
            }),
        );

        controller.tick(TICK, InputSnapshot { start: true, ..Default::default() });
        tick_until(
            &mut controller,
            |_| {
                InputSnapshot::default()
            },
            |c| {
                // Complete the visit task as soon as it activates.
                if let Some(handle) = slot.borrow().as_ref() {
                    handle.signal();
                }
                c.state() == ExperimentState::AwaitingExit && c.pending_markers() == 0
            },
        );
        tick_until(
            &mut controller,
            |_| InputSnapshot { confirm: true, ..Default::default() },
            |c| c.state() == ExperimentState::Completed && c.pending_markers() == 0,
        );

        assert_eq!(
            *names.borrow(),
            vec![
                "Start",
                "MindfulnessBegin",
                "MindfulnessEnd",
                "RestBegin",
                "RestEnd",
                "VisitBegin",
                "VisitEnd",
                "End",
            ]
        );
    }

    #[test]
    fn all_tasks_disabled_runs_mindfulness_only() {
        let config = SequenceConfig {
            mindfulness_secs: 0.5,
            rest_secs: 0.5,
            enable_visit: false,
            enable_select: false,
            enable_manipulation: false,
        };
        let (mut controller, names) = controller(config);
        controller.tick(TICK, InputSnapshot { start: true, ..Default::default() });
        tick_until(
            &mut controller,
            |_| InputSnapshot::default(),
            |c| c.state() == ExperimentState::AwaitingExit && c.pending_markers() == 0,
        );
        assert_eq!(
            *names.borrow(),
            vec!["Start", "MindfulnessBegin", "MindfulnessEnd", "End"]
        );
    }

    #[test]
    fn duration_query_returns_sentinel_before_the_phase_runs() {
        let (mut controller, _names) = controller(visit_only_config());
        assert_eq!(controller.task_duration("Select"), None);
        controller.tick(TICK, InputSnapshot { start: true, ..Default::default() });
        assert_eq!(controller.task_duration("Visit"), None);
        // No adapter registered: the visit phase resolves immediately.
        tick_until(
            &mut controller,
            |_| InputSnapshot::default(),
            |c| c.state() == ExperimentState::AwaitingExit,
        );
        assert!(controller.task_duration("Visit").unwrap() >= 0.0);
        assert_eq!(controller.task_duration("Select"), None);
    }

    #[test]
    fn completion_observer_fires_exactly_once() {
        let (mut controller, _names) = controller(SequenceConfig {
            mindfulness_secs: 0.2,
            rest_secs: 0.2,
            enable_visit: false,
            enable_select: false,
            enable_manipulation: false,
        });
        let fired = Rc::new(RefCell::new(0usize));
        let fired_in_observer = Rc::clone(&fired);
        controller.on_complete(Box::new(move |records| {
            assert!(records.duration("Mindfulness").is_some());
            *fired_in_observer.borrow_mut() += 1;
        }));

        controller.tick(TICK, InputSnapshot { start: true, ..Default::default() });
        tick_until(
            &mut controller,
            |_| InputSnapshot { confirm: true, ..Default::default() },
            |c| c.state() == ExperimentState::Completed,
        );
        // Extra confirm ticks after completion must not re-fire.
        for _ in 0..5 {
            controller.tick(TICK, InputSnapshot { confirm: true, ..Default::default() });
        }
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn forced_sickness_reports_share_the_cooldown() {
        let (mut controller, names) = controller(visit_only_config());
        controller.force_sickness_marker();
        controller.force_sickness_marker();
        controller.tick(TICK, InputSnapshot::default());
        controller.tick(TICK, InputSnapshot::default());
        assert_eq!(*names.borrow(), vec!["Sickness"]);
    }

    #[test]
    fn named_markers_pass_through_when_recognized() {
        let (mut controller, names) = controller(visit_only_config());
        assert!(controller.push_marker_named("RestBegin"));
        assert!(!controller.push_marker_named("Teleport"));
        controller.tick(TICK, InputSnapshot::default());
        controller.tick(TICK, InputSnapshot::default());
        assert_eq!(*names.borrow(), vec!["RestBegin"]);
    }

    #[test]
    fn sickness_markers_flow_in_any_state() {
        let (mut controller, names) = controller(visit_only_config());
        controller.tick(TICK, InputSnapshot { sickness: true, ..Default::default() });
        controller.tick(TICK, InputSnapshot::default());
        assert_eq!(*names.borrow(), vec!["Sickness"]);
        assert_eq!(controller.state(), ExperimentState::NotStarted);
    }

    #[test]
    fn shutdown_halts_without_end_markers() {
        let (mut controller, names) = controller(visit_only_config());
        controller.tick(TICK, InputSnapshot { start: true, ..Default::default() });
        for _ in 0..3 {
            controller.tick(TICK, InputSnapshot::default());
        }
        controller.shutdown();
        // Drain whatever was enqueued before the shutdown.
        for _ in 0..10 {
            controller.tick(TICK, InputSnapshot::default());
        }
        let names = names.borrow();
        assert!(names.contains(&"MindfulnessBegin".to_string()));
        assert!(!names.contains(&"MindfulnessEnd".to_string()));
    }
}
