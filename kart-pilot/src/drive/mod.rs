pub mod clock;
pub mod command;
pub mod decision;
pub mod state;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use command::Command;
pub use decision::decide;
pub use state::ControllerState;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) const STOP_DURATION_SECS: f64 = 5.0; // Mandatory stop at a sign
pub(crate) const COOLDOWN_DURATION_SECS: f64 = 20.0; // Before another sign may stop the kart
pub(crate) const MIN_STEER: i32 = -220;
pub(crate) const MAX_STEER: i32 = 220;
pub(crate) const CRUISE_SPEED: u8 = 30;

/// A person whose box is wider than this is close enough to stop for.
pub(crate) const PERSON_WIDTH_THRESHOLD: i32 = 100;
/// A stop sign whose box is wider than this is close enough to obey.
pub(crate) const STOP_SIGN_WIDTH_THRESHOLD: i32 = 75;

/// Road centre, in percent of frame width, that means "straight ahead".
pub(crate) const ROAD_CENTER_PERCENT: i32 = 50;
/// Steering units per percentage point of road offset are `max_steer / STEER_GAIN_DIVISOR`.
pub(crate) const STEER_GAIN_DIVISOR: f64 = 10.0;

/// Tunables of the decision core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub stop_duration_secs: f64,
    pub cooldown_duration_secs: f64,
    pub min_steer: i32,
    pub max_steer: i32,
    pub person_width_px: i32,
    pub stop_sign_width_px: i32,
    pub cruise_speed: u8,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            stop_duration_secs: STOP_DURATION_SECS,
            cooldown_duration_secs: COOLDOWN_DURATION_SECS,
            min_steer: MIN_STEER,
            max_steer: MAX_STEER,
            person_width_px: PERSON_WIDTH_THRESHOLD,
            stop_sign_width_px: STOP_SIGN_WIDTH_THRESHOLD,
            cruise_speed: CRUISE_SPEED,
        }
    }
}

impl DecisionConfig {
    pub fn stop_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.stop_duration_secs).unwrap_or_default()
    }

    pub fn cooldown_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_duration_secs).unwrap_or_default()
    }
}
