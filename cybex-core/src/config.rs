use serde::{Deserialize, Serialize};

use crate::phase::TaskKind;

/// Immutable per-run protocol parameters, read once at sequence start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub mindfulness_secs: f64,
    pub rest_secs: f64,
    pub enable_visit: bool,
    pub enable_select: bool,
    pub enable_manipulation: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            mindfulness_secs: 300.0,
            rest_secs: 60.0,
            enable_visit: true,
            enable_select: true,
            enable_manipulation: true,
        }
    }
}

impl SequenceConfig {
    pub fn enabled(&self, task: TaskKind) -> bool {
        match task {
            TaskKind::Visit => self.enable_visit,
            TaskKind::Select => self.enable_select,
            TaskKind::Manipulation => self.enable_manipulation,
        }
    }

    pub fn enabled_tasks(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .filter(|t| self.enabled(*t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_task() {
        let cfg = SequenceConfig::default();
        assert_eq!(cfg.enabled_tasks(), TaskKind::ALL.to_vec());
    }

    #[test]
    fn enabled_tasks_respects_flags() {
        let cfg = SequenceConfig {
            enable_select: false,
            ..SequenceConfig::default()
        };
        assert_eq!(
            cfg.enabled_tasks(),
            vec![TaskKind::Visit, TaskKind::Manipulation]
        );
    }
}
