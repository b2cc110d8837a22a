use std::cell::Cell;
use std::rc::Rc;

use log::warn;

use cybex_core::TaskKind;

/// Lifecycle seam implemented by each pluggable task module.
///
/// The sequencer activates the adapter with a fresh [`CompletionHandle`],
/// waits cooperatively until it fires, then deactivates. The handle fires at
/// most once per activation; the second and later signals are ignored.
pub trait TaskAdapter {
    fn activate(&mut self, done: CompletionHandle);
    fn deactivate(&mut self);
}

/// Receiving side of a task's single-shot completion signal.
pub struct CompletionLatch {
    fired: Rc<Cell<bool>>,
}

/// Signalling side handed to the task adapter on activation.
#[derive(Clone)]
pub struct CompletionHandle {
    fired: Rc<Cell<bool>>,
}

impl CompletionLatch {
    pub fn new() -> (CompletionLatch, CompletionHandle) {
        let fired = Rc::new(Cell::new(false));
        (
            CompletionLatch {
                fired: Rc::clone(&fired),
            },
            CompletionHandle { fired },
        )
    }

    pub fn is_set(&self) -> bool {
        self.fired.get()
    }
}

impl CompletionHandle {
    pub fn signal(&self) {
        if self.fired.get() {
            warn!("duplicate task completion signal ignored");
            return;
        }
        self.fired.set(true);
    }
}

/// Adapter slots for the three tasks; an empty slot degrades that task's
/// phase to an immediate resolve instead of hanging the sequence.
#[derive(Default)]
pub struct TaskRegistry {
    visit: Option<Box<dyn TaskAdapter>>,
    select: Option<Box<dyn TaskAdapter>>,
    manipulation: Option<Box<dyn TaskAdapter>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: TaskKind, adapter: Box<dyn TaskAdapter>) {
        let slot = self.slot_mut(task);
        if slot.is_some() {
            warn!("replacing adapter already registered for {} task", task.name());
        }
        *slot = Some(adapter);
    }

    pub fn get_mut(&mut self, task: TaskKind) -> Option<&mut Box<dyn TaskAdapter>> {
        self.slot_mut(task).as_mut()
    }

    pub fn is_registered(&self, task: TaskKind) -> bool {
        match task {
            TaskKind::Visit => self.visit.is_some(),
            TaskKind::Select => self.select.is_some(),
            TaskKind::Manipulation => self.manipulation.is_some(),
        }
    }

    fn slot_mut(&mut self, task: TaskKind) -> &mut Option<Box<dyn TaskAdapter>> {
        match task {
            TaskKind::Visit => &mut self.visit,
            TaskKind::Select => &mut self.select,
            TaskKind::Manipulation => &mut self.manipulation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_fires_at_most_once() {
        let (latch, handle) = CompletionLatch::new();
        assert!(!latch.is_set());
        handle.signal();
        assert!(latch.is_set());
        // Second signal is swallowed without disturbing the latch.
        handle.signal();
        assert!(latch.is_set());
    }

    #[test]
    fn stale_handles_do_not_reach_a_new_latch() {
        let (_old_latch, old_handle) = CompletionLatch::new();
        let (latch, _handle) = CompletionLatch::new();
        old_handle.signal();
        assert!(!latch.is_set());
    }

    struct Noop;
    impl TaskAdapter for Noop {
        fn activate(&mut self, _done: CompletionHandle) {}
        fn deactivate(&mut self) {}
    }

    #[test]
    fn registry_tracks_per_task_slots() {
        let mut registry = TaskRegistry::new();
        assert!(!registry.is_registered(TaskKind::Select));
        registry.register(TaskKind::Select, Box::new(Noop));
        assert!(registry.is_registered(TaskKind::Select));
        assert!(registry.get_mut(TaskKind::Visit).is_none());
        assert!(registry.get_mut(TaskKind::Select).is_some());
    }
}
