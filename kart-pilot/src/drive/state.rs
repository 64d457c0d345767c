use std::time::Duration;

/// Timers that survive from one tick to the next.
///
/// `None` means the timer is inactive. A cooldown only ever starts when a stop completes, so the
/// two never suppress stop-sign triggers at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub stop_sign_timer: Option<Duration>,
    pub cooldown_timer: Option<Duration>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_holding_at_sign(&self) -> bool {
        self.stop_sign_timer.is_some()
    }

    /// Whether a stop sign seen at `now` would be ignored.
    pub fn is_cooling_down(&self, now: Duration, cooldown: Duration) -> bool {
        self.cooldown_timer
            .is_some_and(|started| now.saturating_sub(started) < cooldown)
    }
}
