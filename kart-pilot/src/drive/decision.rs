use crate::drive::command::Command;
use crate::drive::state::ControllerState;
use crate::drive::{DecisionConfig, ROAD_CENTER_PERCENT, STEER_GAIN_DIVISOR};
use kart_inference::{CocoClass, Detection};
use log::{debug, info};
use std::time::Duration;

/// Turns one frame's perception into the next command, updating the stop-sign timers.
///
/// Speed comes from the detections only: a close person stops the kart for as long as it is
/// seen, a close stop sign starts a timed stop followed by a cooldown in which signs are ignored.
/// Steering comes from the road estimate only.
///
/// `now` must not go backwards between calls.
pub fn decide(
    state: &mut ControllerState,
    tuning: &DecisionConfig,
    detections: &[Detection],
    road_estimate: Option<u8>,
    now: Duration,
) -> Command {
    let mut speed = tuning.cruise_speed;

    if let Some(started) = state.stop_sign_timer {
        if now.saturating_sub(started) >= tuning.stop_duration() {
            info!("Stop sign wait finished, cooldown started");
            state.stop_sign_timer = None;
            state.cooldown_timer = Some(now);
        } else {
            speed = 0;
        }
    }
    if state.cooldown_timer.is_some() && !state.is_cooling_down(now, tuning.cooldown_duration()) {
        debug!("Cooldown over");
        state.cooldown_timer = None;
    }

    for detection in detections {
        let width = detection.width();
        if detection.is(CocoClass::Person) && width > tuning.person_width_px {
            debug!("Person {} px wide ahead", width);
            speed = 0;
        }
        if detection.is(CocoClass::StopSign) && width > tuning.stop_sign_width_px {
            if state.is_cooling_down(now, tuning.cooldown_duration()) {
                debug!("Ignoring stop sign during cooldown");
                continue;
            }
            if state.stop_sign_timer.is_none() {
                info!("Stopping for stop sign");
                state.stop_sign_timer = Some(now);
            }
            speed = 0;
        }
    }

    let steering = road_estimate
        .map(|center| steering_for(center, tuning))
        .unwrap_or(0);

    Command::new(steering, speed)
}

/// Linear road-offset to steering map, clamped to the configured rails.
pub fn steering_for(road_center: u8, tuning: &DecisionConfig) -> i32 {
    let offset = (road_center as i32 - ROAD_CENTER_PERCENT) as f64;
    let steering = (offset * tuning.max_steer as f64 / STEER_GAIN_DIVISOR).round() as i32;
    steering.min(tuning.max_steer).max(tuning.min_steer)
}
