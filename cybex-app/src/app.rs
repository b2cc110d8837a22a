use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

use cybex_core::{ExperimentState, SequenceConfig, TaskKind};
use cybex_experiment::{ExperimentController, InputSnapshot, SicknessReporter};
use cybex_timing::{MonotonicClock, TickPacer};

use crate::console::{
    ConsoleDisplay, ConsoleMarkerSink, ConsoleTask, FileMarkerSink, SharedCompletion,
};

/// Top-level driver configuration, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub sequence: SequenceConfig,
    /// Marker log path; when unset, markers go to the logging facade.
    pub marker_log: Option<PathBuf>,
    pub tick_hz: Option<f64>,
    /// Overrides both the sickness cooldown and acknowledgment window.
    pub sickness_cooldown_secs: Option<f64>,
}

impl AppConfig {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("cannot parse config {}", path.display()))
    }
}

/// Operator console commands, one per line on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Confirm,
    Sick,
    Done,
    /// Extra marker by name, e.g. for annotating incidents.
    Mark(String),
    Status,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix("mark ") {
        return Some(Command::Mark(name.trim().to_string()));
    }
    match line.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "confirm" => Some(Command::Confirm),
        "sick" => Some(Command::Sick),
        "done" => Some(Command::Done),
        "status" => Some(Command::Status),
        "quit" | "exit" => Some(Command::Quit),
        "" => None,
        other => {
            warn!("unknown command {other:?}");
            None
        }
    }
}

/// Spawns the stdin reader; each parsed command is one edge-clean pulse.
/// EOF turns into a quit so a closed pipe still tears the session down.
fn spawn_console_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => {
                    let _ = tx.send(Command::Quit);
                    return;
                }
                Ok(_) => {
                    if let Some(cmd) = parse_command(&line) {
                        if tx.send(cmd).is_err() {
                            return;
                        }
                    }
                }
                Err(_) => {
                    let _ = tx.send(Command::Quit);
                    return;
                }
            }
        }
    });
    rx
}

/// Owns the controller and the tick loop; funnels console commands into
/// per-tick input snapshots the way a headset input layer would.
pub struct App {
    controller: ExperimentController,
    completion: SharedCompletion,
    clock: MonotonicClock,
    pacer: TickPacer,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut controller = ExperimentController::new(config.sequence.clone());
        controller.set_display(Box::new(ConsoleDisplay::new()));
        match &config.marker_log {
            Some(path) => controller.set_marker_sink(Box::new(FileMarkerSink::create(path)?)),
            None => controller.set_marker_sink(Box::new(ConsoleMarkerSink)),
        }

        let completion = SharedCompletion::new();
        controller.register_task(
            TaskKind::Visit,
            Box::new(ConsoleTask::new("Visit", completion.clone())),
        );
        controller.register_task(
            TaskKind::Select,
            Box::new(ConsoleTask::new("Select", completion.clone())),
        );
        controller.register_task(
            TaskKind::Manipulation,
            Box::new(ConsoleTask::new("Manipulation", completion.clone())),
        );

        if let Some(secs) = config.sickness_cooldown_secs {
            let window = Duration::from_secs_f64(secs.max(0.0));
            controller.set_sickness_reporter(SicknessReporter::with_durations(window, window));
        }

        controller.on_complete(Box::new(|records| {
            println!("=== Recorded durations ===");
            print!("{}", records.summary());
        }));

        Ok(Self {
            controller,
            completion,
            clock: MonotonicClock::new(),
            pacer: TickPacer::new(config.tick_hz.unwrap_or(90.0)),
        })
    }

    pub fn run(mut self) -> Result<()> {
        println!("=== CYBERSICKNESS EXPERIMENT CONSOLE ===");
        println!("Commands: start, confirm, sick, done, mark <name>, status, quit");

        let commands = spawn_console_reader();
        loop {
            let dt = self.pacer.wait(&self.clock);
            let mut input = InputSnapshot::default();
            let mut quit = false;
            loop {
                match commands.try_recv() {
                    Ok(Command::Start) => input.start = true,
                    Ok(Command::Confirm) => input.confirm = true,
                    Ok(Command::Sick) => input.sickness = true,
                    Ok(Command::Done) => {
                        if !self.completion.signal() {
                            warn!("no task is active, 'done' ignored");
                        }
                    }
                    Ok(Command::Mark(name)) => {
                        self.controller.push_marker_named(&name);
                    }
                    Ok(Command::Status) => self.print_status(),
                    Ok(Command::Quit) => quit = true,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        quit = true;
                        break;
                    }
                }
            }

            if quit {
                self.controller.shutdown();
                self.drain_pending(dt);
                break;
            }

            if self.controller.tick(dt, input) == ExperimentState::Completed {
                self.drain_pending(dt);
                break;
            }
        }

        let stats = self.pacer.stats();
        info!(
            "tick rate {:.1} Hz, jitter {:.3} ms",
            stats.effective_hz,
            stats.jitter_ns / 1e6
        );
        println!("Session closed.");
        Ok(())
    }

    fn print_status(&self) {
        println!(
            "state {:?}, {} markers pending{}",
            self.controller.state(),
            self.controller.pending_markers(),
            if self.controller.sickness_ack_visible() {
                ", sickness acknowledged"
            } else {
                ""
            }
        );
        if !self.controller.all_task_durations().is_empty() {
            print!("{}", self.controller.all_task_durations().summary());
        }
    }

    /// One marker leaves the queue per tick; keep ticking until it is empty.
    fn drain_pending(&mut self, dt: Duration) {
        while self.controller.pending_markers() > 0 {
            self.controller.tick(dt, InputSnapshot::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_case_insensitively() {
        assert_eq!(parse_command(" Start \n"), Some(Command::Start));
        assert_eq!(parse_command("DONE"), Some(Command::Done));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("teleport"), None);
    }

    #[test]
    fn mark_command_keeps_the_name_verbatim() {
        assert_eq!(
            parse_command("mark VisitBegin\n"),
            Some(Command::Mark("VisitBegin".to_string()))
        );
    }

    #[test]
    fn app_config_defaults_are_usable() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(config.marker_log.is_none());
        assert!(config.sequence.enable_visit);
    }

    #[test]
    fn app_config_reads_nested_sequence_fields() {
        let config: AppConfig = serde_json::from_str(
            r#"{"sequence": {"mindfulness_secs": 10.0, "enable_select": false}, "tick_hz": 30.0}"#,
        )
        .unwrap();
        assert_eq!(config.sequence.mindfulness_secs, 10.0);
        assert!(!config.sequence.enable_select);
        assert_eq!(config.tick_hz, Some(30.0));
    }
}
