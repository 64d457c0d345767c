use anyhow::{anyhow, bail, Result};
use kart_inference::{BoundingBox, Detection, ObjectDetector, RoadEstimator};
use kart_media::{Frame, FrameSource, RGB};
use kart_pilot::drive::{Command, DecisionConfig, ManualClock, MonotonicClock};
use kart_pilot::link::CommandSink;
use kart_pilot::pilot::{Pilot, StopReason};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const PERIOD: Duration = Duration::from_millis(1);

struct CountedSource {
    remaining: Option<usize>,
    released: Arc<AtomicBool>,
}

impl CountedSource {
    fn new(frames: Option<usize>) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        (
            Self {
                remaining: frames,
                released: released.clone(),
            },
            released,
        )
    }
}

impl FrameSource for CountedSource {
    fn capture(&mut self) -> Result<Frame> {
        match self.remaining.as_mut() {
            Some(0) => bail!("camera unplugged"),
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        Ok(Frame::filled(4, 4, RGB(0, 0, 0)))
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Replays one detection list per call, then empty lists; `None` entries fail the call.
#[derive(Default)]
struct ScriptedDetector(VecDeque<Option<Vec<Detection>>>);

impl ObjectDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        match self.0.pop_front() {
            Some(Some(detections)) => Ok(detections),
            Some(None) => Err(anyhow!("malformed detector output")),
            None => Ok(Vec::new()),
        }
    }
}

/// Finds nothing, blocking for the given time on every frame.
struct SlowDetector(Duration);

impl ObjectDetector for SlowDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        std::thread::sleep(self.0);
        Ok(Vec::new())
    }
}

struct FixedRoad(Option<u8>);

impl RoadEstimator for FixedRoad {
    fn estimate(&mut self, _frame: &Frame) -> Result<Option<u8>> {
        Ok(self.0)
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    broken: bool,
}

impl RecordingSink {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl CommandSink for RecordingSink {
    fn send_line(&mut self, line: &str) -> Result<()> {
        if self.broken {
            bail!("serial write failed");
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn stop_sign() -> Detection {
    Detection::new("stop sign", 0.9, BoundingBox::new(0, 0, 100, 100).unwrap()).unwrap()
}

fn never() -> impl std::future::Future<Output = ()> {
    std::future::pending()
}

#[tokio::test]
async fn capture_failure_ends_loop_with_a_stop_command() -> Result<()> {
    let (source, released) = CountedSource::new(Some(3));
    let sink = RecordingSink::default();
    let pilot = Pilot::new(
        source,
        ScriptedDetector::default(),
        FixedRoad(Some(51)),
        sink.clone(),
        MonotonicClock::new(),
        DecisionConfig::default(),
        PERIOD,
    );

    assert_eq!(pilot.run(never()).await?, StopReason::CaptureFailed);
    assert_eq!(sink.lines(), vec!["22030\n", "22030\n", "22030\n", "0\n"]);
    assert!(released.load(Ordering::SeqCst));
    assert!(sink.closed.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn perception_error_still_stops_the_kart() -> Result<()> {
    let (source, released) = CountedSource::new(None);
    let sink = RecordingSink::default();
    let detector = ScriptedDetector(VecDeque::from([Some(vec![]), None]));
    let pilot = Pilot::new(
        source,
        detector,
        FixedRoad(None),
        sink.clone(),
        MonotonicClock::new(),
        DecisionConfig::default(),
        PERIOD,
    );

    let err = pilot.run(never()).await.unwrap_err();
    assert!(err.to_string().contains("malformed"));
    assert_eq!(sink.lines(), vec!["30\n", "0\n"]);
    assert!(released.load(Ordering::SeqCst));
    assert!(sink.closed.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_fatal() -> Result<()> {
    let (source, released) = CountedSource::new(None);
    let sink = RecordingSink {
        broken: true,
        ..RecordingSink::default()
    };
    let pilot = Pilot::new(
        source,
        ScriptedDetector::default(),
        FixedRoad(None),
        sink.clone(),
        MonotonicClock::new(),
        DecisionConfig::default(),
        PERIOD,
    );

    assert!(pilot.run(never()).await.is_err());
    assert!(sink.lines().is_empty());
    assert!(released.load(Ordering::SeqCst));
    assert!(sink.closed.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn interrupt_ends_loop_with_a_stop_command() -> Result<()> {
    let (source, released) = CountedSource::new(None);
    let sink = RecordingSink::default();
    let pilot = Pilot::new(
        source,
        ScriptedDetector::default(),
        FixedRoad(Some(50)),
        sink.clone(),
        MonotonicClock::new(),
        DecisionConfig::default(),
        Duration::from_millis(5),
    );

    let reason = pilot
        .run(tokio::time::sleep(Duration::from_millis(30)))
        .await?;
    assert_eq!(reason, StopReason::Interrupted);

    let lines = sink.lines();
    assert!(lines.len() >= 2);
    assert_eq!(lines.last().map(String::as_str), Some("0\n"));
    assert!(lines[..lines.len() - 1].iter().all(|line| line == "30\n"));
    assert!(released.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn steps_follow_the_injected_clock() -> Result<()> {
    let (source, _) = CountedSource::new(None);
    let sink = RecordingSink::default();
    let clock = ManualClock::default();
    let detector = ScriptedDetector(VecDeque::from([
        Some(vec![stop_sign()]),
        Some(vec![]),
        Some(vec![]),
        Some(vec![stop_sign()]),
        Some(vec![stop_sign()]),
    ]));
    let mut pilot = Pilot::new(
        source,
        detector,
        FixedRoad(Some(48)),
        sink.clone(),
        clock.clone(),
        DecisionConfig::default(),
        PERIOD,
    );
    let frame = Frame::filled(4, 4, RGB(0, 0, 0));

    assert_eq!(pilot.step(&frame)?, Command::new(-44, 0));
    clock.advance(Duration::from_secs(4));
    assert_eq!(pilot.step(&frame)?.speed, 0);
    clock.advance(Duration::from_secs(1));
    assert_eq!(pilot.step(&frame)?.speed, 30);
    assert_eq!(pilot.state().cooldown_timer, Some(Duration::from_secs(5)));

    clock.advance(Duration::from_secs(5));
    assert_eq!(pilot.step(&frame)?.speed, 30);
    clock.advance(Duration::from_secs(15));
    assert_eq!(pilot.step(&frame)?.speed, 0);

    assert_eq!(
        sink.lines(),
        vec!["-44000\n", "-44000\n", "-44030\n", "-44030\n", "-44000\n"]
    );
    Ok(())
}

#[tokio::test]
async fn fast_ticks_sleep_out_the_period() -> Result<()> {
    let (source, _) = CountedSource::new(Some(4));
    let sink = RecordingSink::default();
    let period = Duration::from_millis(100);
    let pilot = Pilot::new(
        source,
        SlowDetector(Duration::from_millis(30)),
        FixedRoad(None),
        sink.clone(),
        MonotonicClock::new(),
        DecisionConfig::default(),
        period,
    );

    let started = Instant::now();
    assert_eq!(pilot.run(never()).await?, StopReason::CaptureFailed);
    let elapsed = started.elapsed();

    assert!(elapsed >= period * 4 - Duration::from_millis(20), "took {elapsed:?}");
    assert_eq!(sink.lines(), vec!["30\n", "30\n", "30\n", "30\n", "0\n"]);
    Ok(())
}

#[tokio::test]
async fn overrunning_ticks_start_the_next_one_at_once() -> Result<()> {
    let (source, _) = CountedSource::new(Some(5));
    let sink = RecordingSink::default();
    let work = Duration::from_millis(30);
    let period = Duration::from_millis(10);
    let pilot = Pilot::new(
        source,
        SlowDetector(work),
        FixedRoad(None),
        sink.clone(),
        MonotonicClock::new(),
        DecisionConfig::default(),
        period,
    );

    let started = Instant::now();
    assert_eq!(pilot.run(never()).await?, StopReason::CaptureFailed);
    let elapsed = started.elapsed();

    assert!(elapsed >= work * 5, "took {elapsed:?}");
    assert!(elapsed < (work + period) * 5, "took {elapsed:?}");
    assert_eq!(sink.lines().len(), 6);
    assert_eq!(sink.lines().last().map(String::as_str), Some("0\n"));
    Ok(())
}
