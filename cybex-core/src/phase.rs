use std::time::Duration;

use crate::config::SequenceConfig;
use crate::marker::Marker;

/// The three pluggable task modules, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Visit,
    Select,
    Manipulation,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Visit, TaskKind::Select, TaskKind::Manipulation];

    pub fn label(&self) -> PhaseLabel {
        match self {
            TaskKind::Visit => PhaseLabel::Visit,
            TaskKind::Select => PhaseLabel::Select,
            TaskKind::Manipulation => PhaseLabel::Manipulation,
        }
    }

    pub fn name(&self) -> &'static str {
        self.label().name()
    }
}

/// Names of the protocol's phases; `Rest` is shared by every rest occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseLabel {
    Mindfulness,
    Rest,
    Visit,
    Select,
    Manipulation,
}

impl PhaseLabel {
    pub fn name(&self) -> &'static str {
        match self {
            PhaseLabel::Mindfulness => "Mindfulness",
            PhaseLabel::Rest => "Rest",
            PhaseLabel::Visit => "Visit",
            PhaseLabel::Select => "Select",
            PhaseLabel::Manipulation => "Manipulation",
        }
    }

    pub fn begin_marker(&self) -> Marker {
        match self {
            PhaseLabel::Mindfulness => Marker::MindfulnessBegin,
            PhaseLabel::Rest => Marker::RestBegin,
            PhaseLabel::Visit => Marker::VisitBegin,
            PhaseLabel::Select => Marker::SelectBegin,
            PhaseLabel::Manipulation => Marker::ManiBegin,
        }
    }

    pub fn end_marker(&self) -> Marker {
        match self {
            PhaseLabel::Mindfulness => Marker::MindfulnessEnd,
            PhaseLabel::Rest => Marker::RestEnd,
            PhaseLabel::Visit => Marker::VisitEnd,
            PhaseLabel::Select => Marker::SelectEnd,
            PhaseLabel::Manipulation => Marker::ManiEnd,
        }
    }
}

/// How a phase runs: a fixed countdown or a wait on a task's completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// `next` is set only on rest phases, for display.
    Timed {
        duration: Duration,
        next: Option<TaskKind>,
    },
    TaskBound { task: TaskKind },
}

/// One step of the fixed protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    pub label: PhaseLabel,
    pub kind: PhaseKind,
}

impl PhaseSpec {
    fn mindfulness(duration: Duration) -> Self {
        Self {
            label: PhaseLabel::Mindfulness,
            kind: PhaseKind::Timed {
                duration,
                next: None,
            },
        }
    }

    fn rest(duration: Duration, next: TaskKind) -> Self {
        Self {
            label: PhaseLabel::Rest,
            kind: PhaseKind::Timed {
                duration,
                next: Some(next),
            },
        }
    }

    fn task(task: TaskKind) -> Self {
        Self {
            label: task.label(),
            kind: PhaseKind::TaskBound { task },
        }
    }

    /// Label shown to the participant; rest phases announce the upcoming task.
    pub fn display_label(&self) -> String {
        match self.kind {
            PhaseKind::Timed { next: Some(task), .. } => {
                format!("{} (next: {})", self.label.name(), task.name())
            }
            _ => self.label.name().to_string(),
        }
    }
}

/// Lifecycle of a whole run; transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentState {
    NotStarted,
    Running,
    AwaitingExit,
    Completed,
}

/// Produces the ordered phase list for one run.
///
/// Mindfulness always comes first. Each enabled task is preceded by its own
/// rest phase; disabled tasks contribute neither. With every task disabled the
/// schedule is mindfulness alone.
pub fn build_schedule(config: &SequenceConfig) -> Vec<PhaseSpec> {
    let mut schedule = vec![PhaseSpec::mindfulness(Duration::from_secs_f64(
        config.mindfulness_secs.max(0.0),
    ))];
    let rest = Duration::from_secs_f64(config.rest_secs.max(0.0));
    for task in TaskKind::ALL {
        if config.enabled(task) {
            schedule.push(PhaseSpec::rest(rest, task));
            schedule.push(PhaseSpec::task(task));
        }
    }
    schedule
}
