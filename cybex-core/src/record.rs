use std::fmt::Write as _;

use serde::Serialize;

/// Elapsed seconds per phase name, in first-recorded order.
///
/// At most one entry per name: recording an already-present name overwrites
/// its value in place, so repeated rest phases keep only the last duration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseRecords {
    entries: Vec<(String, f64)>,
}

impl PhaseRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `secs` under `name`, returning the overwritten value if any.
    pub fn record(&mut self, name: &str, secs: f64) -> Option<f64> {
        for (existing, value) in &mut self.entries {
            if existing == name {
                let previous = *value;
                *value = secs;
                return Some(previous);
            }
        }
        self.entries.push((name.to_string(), secs));
        None
    }

    pub fn duration(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, secs)| *secs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, secs)| (name.as_str(), *secs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per phase, in recorded order: `"<phase>: <secs>s"`.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (name, secs) in self.iter() {
            let _ = writeln!(out, "{}: {:.2}s", name, secs);
        }
        out
    }
}
