use std::time::Duration;

use log::{debug, info};

use cybex_core::Marker;

use crate::markers::MarkerQueue;

/// Default for both the report cooldown and the acknowledgment window.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Debounced participant sickness reporting, independent of phase state.
///
/// A report locks the reporter for the cooldown, so a held trigger yields one
/// marker per cooldown window rather than one per tick. The acknowledgment
/// window defaults to the same constant but is an independent field.
pub struct SicknessReporter {
    locked: bool,
    cooldown: Duration,
    ack_window: Duration,
    unlock_remaining: Duration,
    ack_remaining: Duration,
    reports: usize,
}

impl SicknessReporter {
    pub fn new() -> Self {
        Self::with_durations(DEFAULT_COOLDOWN, DEFAULT_COOLDOWN)
    }

    pub fn with_durations(cooldown: Duration, ack_window: Duration) -> Self {
        Self {
            locked: false,
            cooldown,
            ack_window,
            unlock_remaining: Duration::ZERO,
            ack_remaining: Duration::ZERO,
            reports: 0,
        }
    }

    pub fn tick(&mut self, dt: Duration, trigger: bool, markers: &mut MarkerQueue) {
        if self.locked {
            self.unlock_remaining = self.unlock_remaining.saturating_sub(dt);
            if self.unlock_remaining.is_zero() {
                self.locked = false;
            }
        }
        self.ack_remaining = self.ack_remaining.saturating_sub(dt);

        // Edge logic: a held trigger cannot re-fire while locked.
        if !self.locked && trigger {
            self.report(markers);
        }
    }

    /// Programmatic report path, subject to the same lock.
    pub fn force_report(&mut self, markers: &mut MarkerQueue) {
        if self.locked {
            debug!("sickness report suppressed, cooldown active");
            return;
        }
        self.report(markers);
    }

    fn report(&mut self, markers: &mut MarkerQueue) {
        self.locked = true;
        self.unlock_remaining = self.cooldown;
        self.ack_remaining = self.ack_window;
        self.reports += 1;
        markers.enqueue(Marker::Sickness);
        info!("sickness report #{} recorded", self.reports);
    }

    /// True while the visual acknowledgment should be shown.
    pub fn ack_visible(&self) -> bool {
        !self.ack_remaining.is_zero()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn report_count(&self) -> usize {
        self.reports
    }
}

impl Default for SicknessReporter {
    fn default() -> Self {
        Self::new()
    }
}
