use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{info, warn};

use cybex_experiment::{CompletionHandle, Display, MarkerSink, TaskAdapter};
use cybex_timing::{Clock, MonotonicClock};

/// Terminal stand-in for the participant's in-headset display.
pub struct ConsoleDisplay {
    last_whole_secs: Option<i64>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self {
            last_whole_secs: None,
        }
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConsoleDisplay {
    fn show_prompt(&mut self, text: &str) {
        self.last_whole_secs = None;
        println!(">>> {text}");
    }

    fn update_timer(&mut self, phase_label: &str, remaining_secs: f64) {
        // One line per whole second is enough for an operator console.
        let whole = remaining_secs.ceil() as i64;
        if self.last_whole_secs != Some(whole) {
            self.last_whole_secs = Some(whole);
            println!("    [{phase_label}] {whole}s remaining");
        }
    }

    fn hide_display(&mut self) {
        self.last_whole_secs = None;
    }
}

/// Marker sink that logs through the facade; useful for dry runs.
pub struct ConsoleMarkerSink;

impl MarkerSink for ConsoleMarkerSink {
    fn push_marker(&mut self, name: &str) {
        info!("marker {name}");
    }
}

/// Appends `"<elapsed-secs>\t<name>"` lines, stamping receive time against
/// its own monotonic clock.
pub struct FileMarkerSink {
    out: BufWriter<File>,
    clock: MonotonicClock,
}

impl FileMarkerSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("cannot create marker log {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            clock: MonotonicClock::new(),
        })
    }
}

impl MarkerSink for FileMarkerSink {
    fn push_marker(&mut self, name: &str) {
        let stamp = self.clock.now().as_secs_f64();
        let written = writeln!(self.out, "{stamp:.3}\t{name}");
        if written.and_then(|_| self.out.flush()).is_err() {
            warn!("marker {name} could not be written to the log");
        }
    }
}

/// One shared slot holding the active task's completion handle. Only one
/// task phase runs at a time, so a single slot serves all three adapters.
#[derive(Clone, Default)]
pub struct SharedCompletion {
    handle: Rc<RefCell<Option<CompletionHandle>>>,
}

impl SharedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&self, handle: CompletionHandle) {
        *self.handle.borrow_mut() = Some(handle);
    }

    fn disarm(&self) {
        *self.handle.borrow_mut() = None;
    }

    /// Signals the active task, if any. Returns false when no task is active.
    pub fn signal(&self) -> bool {
        match self.handle.borrow().as_ref() {
            Some(handle) => {
                handle.signal();
                true
            }
            None => false,
        }
    }
}

/// Stub task module completed by the operator typing `done`; stands in for
/// a VR task collaborator during dry runs.
pub struct ConsoleTask {
    label: &'static str,
    completion: SharedCompletion,
}

impl ConsoleTask {
    pub fn new(label: &'static str, completion: SharedCompletion) -> Self {
        Self { label, completion }
    }
}

impl TaskAdapter for ConsoleTask {
    fn activate(&mut self, done: CompletionHandle) {
        self.completion.arm(done);
        println!(">>> {} task active. Type 'done' when the participant finishes.", self.label);
    }

    fn deactivate(&mut self) {
        self.completion.disarm();
        println!(">>> {} task finished.", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cybex_experiment::CompletionLatch;

    #[test]
    fn shared_completion_signals_only_while_armed() {
        let completion = SharedCompletion::new();
        assert!(!completion.signal());

        let (latch, handle) = CompletionLatch::new();
        let mut task = ConsoleTask::new("Visit", completion.clone());
        task.activate(handle);
        assert!(completion.signal());
        assert!(latch.is_set());

        task.deactivate();
        assert!(!completion.signal());
    }
}
