use std::time::{Duration, Instant};

/// Show-then-auto-hide state of the control overlay.
///
/// The hide timer is a deadline owned by the controller and driven by the
/// caller's clock through [`ControlsTimer::poll`].
#[derive(Debug, Clone)]
pub struct ControlsTimer {
    visible: bool,
    hide_at: Option<Instant>,
    dwell: Duration,
}

impl ControlsTimer {
    pub fn new(dwell: Duration) -> Self {
        Self {
            visible: false,
            hide_at: None,
            dwell,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Show the controls and restart the hide timer.
    pub fn show(&mut self, now: Instant) {
        self.visible = true;
        self.hide_at = Some(now + self.dwell);
    }

    /// Keep the controls up with no pending hide.
    pub fn suspend(&mut self) {
        self.visible = true;
        self.hide_at = None;
    }

    /// Fire the hide timer if it is due. A due timer is ignored while seeking.
    /// Returns whether the controls are visible afterwards.
    pub fn poll(&mut self, now: Instant, seeking: bool) -> bool {
        if !seeking && self.hide_at.is_some_and(|at| now >= at) {
            self.visible = false;
            self.hide_at = None;
        }
        self.visible
    }

    pub fn cancel(&mut self) {
        self.visible = false;
        self.hide_at = None;
    }
}
