use crate::drive::{decide, Clock, Command, ControllerState, DecisionConfig};
use crate::link::CommandSink;
use anyhow::Result;
use kart_inference::{ObjectDetector, RoadEstimator};
use kart_media::{Frame, FrameSource};
use log::{debug, error, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Why the control loop ended without an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    CaptureFailed,
}

/// The capture → detect → estimate → decide → send pipeline.
pub struct Pilot<S, D, R, T, C> {
    source: S,
    detector: D,
    estimator: R,
    sink: T,
    clock: C,
    tuning: DecisionConfig,
    state: ControllerState,
    period: Duration,
}

impl<S, D, R, T, C> Pilot<S, D, R, T, C>
where
    S: FrameSource,
    D: ObjectDetector,
    R: RoadEstimator,
    T: CommandSink,
    C: Clock,
{
    pub fn new(
        source: S,
        detector: D,
        estimator: R,
        sink: T,
        clock: C,
        tuning: DecisionConfig,
        period: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            estimator,
            sink,
            clock,
            tuning,
            state: ControllerState::new(),
            period,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Perceives `frame`, decides and sends the resulting command.
    pub fn step(&mut self, frame: &Frame) -> Result<Command> {
        let detections = self.detector.detect(frame)?;
        let road_center = self.estimator.estimate(frame)?;
        debug!(
            "{} detections, road centre {:?}",
            detections.len(),
            road_center
        );

        let command = decide(
            &mut self.state,
            &self.tuning,
            &detections,
            road_center,
            self.clock.now(),
        );
        self.sink.send(command)?;
        Ok(command)
    }

    /// Runs ticks at the configured period until the source fails, a stage errors or `shutdown`
    /// completes. Whatever the exit, a stop command is sent before the source and the sink are
    /// released.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<StopReason> {
        tokio::pin!(shutdown);
        info!("Control loop running every {:?}", self.period);

        let outcome = loop {
            let started = Instant::now();

            let frame = match self.source.capture() {
                Ok(frame) => frame,
                Err(err) => {
                    error!("Unable to read from camera: {err:#}");
                    break Ok(StopReason::CaptureFailed);
                }
            };
            if let Err(err) = self.step(&frame) {
                break Err(err);
            }

            let remaining = self.period.saturating_sub(started.elapsed());
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Interrupted by user");
                    break Ok(StopReason::Interrupted);
                }
                _ = tokio::time::sleep(remaining) => {}
            }
        };

        self.shutdown(outcome)
    }

    fn shutdown(mut self, outcome: Result<StopReason>) -> Result<StopReason> {
        let stopped = self.sink.send(Command::STOP);
        self.source.release();
        let closed = self.sink.close();

        match outcome {
            Ok(reason) => {
                stopped?;
                closed?;
                info!("Kart stopped ({:?})", reason);
                Ok(reason)
            }
            Err(err) => {
                if let Err(stop_err) = stopped {
                    error!("Failed to send the final stop command: {stop_err:#}");
                }
                if let Err(close_err) = closed {
                    warn!("Failed to close the command link: {close_err:#}");
                }
                Err(err)
            }
        }
    }
}
