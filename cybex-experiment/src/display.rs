use log::debug;

/// Participant-facing prompt and timer surface. All calls are fire-and-forget.
pub trait Display {
    fn show_prompt(&mut self, text: &str);
    fn update_timer(&mut self, phase_label: &str, remaining_secs: f64);
    fn hide_display(&mut self);
}

/// Fallback when no display collaborator is wired up.
pub struct NullDisplay;

impl Display for NullDisplay {
    fn show_prompt(&mut self, text: &str) {
        debug!("prompt (no display configured): {text}");
    }

    fn update_timer(&mut self, _phase_label: &str, _remaining_secs: f64) {}

    fn hide_display(&mut self) {}
}
