use crate::drive::DecisionConfig;
use anyhow::{ensure, Context, Result};
use clap::Args;
use kart_inference::engine::inference_engine::ExecutionProvider;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub decision: DecisionConfig,
    pub timing: TimingConfig,
    pub serial: SerialConfig,
    pub camera: CameraConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Target period of one control tick, 0.5 s gives 2 Hz.
    pub tick_period_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_period_secs: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub settle_secs: f64,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            settle_secs: 2.0,
            timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index. When unset, `frames` is replayed instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<i32>,
    /// Directory whose image files are replayed as camera frames.
    pub frames: PathBuf,
    /// Frames discarded before the first tick. The control loop starts at once by default.
    pub warmup_frames: usize,
    pub looping: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            frames: PathBuf::from("./data/frames"),
            warmup_frames: 0,
            looping: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: PathBuf,
    pub provider: String,
    pub detect_confidence: f32,
    pub detect_iou: f32,
    /// Share of rows, from the bottom of the frame, used for the road centre.
    pub road_crop_fraction: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/model"),
            provider: "cuda:0".to_string(),
            detect_confidence: 0.25,
            detect_iou: 0.7,
            road_crop_fraction: 1.0,
        }
    }
}

impl PilotConfig {
    /// Reads a TOML config; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        let decision = &self.decision;
        ensure!(
            decision.min_steer <= decision.max_steer,
            "min_steer ({}) must not exceed max_steer ({})",
            decision.min_steer,
            decision.max_steer
        );
        ensure!(
            decision.cruise_speed <= 100,
            "cruise_speed must be within 0..=100, got {}",
            decision.cruise_speed
        );
        for (name, secs) in [
            ("stop_duration_secs", decision.stop_duration_secs),
            ("cooldown_duration_secs", decision.cooldown_duration_secs),
            ("settle_secs", self.serial.settle_secs),
        ] {
            ensure!(secs.is_finite() && secs >= 0.0, "{name} must be a non-negative number of seconds");
        }
        ensure!(
            self.timing.tick_period_secs.is_finite() && self.timing.tick_period_secs > 0.0,
            "tick_period_secs must be positive"
        );
        ensure!(
            (0.0..=1.0).contains(&self.models.detect_confidence)
                && (0.0..=1.0).contains(&self.models.detect_iou),
            "detector thresholds must be within [0, 1]"
        );
        ensure!(
            self.models.road_crop_fraction > 0.0 && self.models.road_crop_fraction <= 1.0,
            "road_crop_fraction must be within (0, 1]"
        );
        self.execution_provider()?;
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.timing.tick_period_secs).unwrap_or_default()
    }

    pub fn serial_settle(&self) -> Duration {
        Duration::try_from_secs_f64(self.serial.settle_secs).unwrap_or_default()
    }

    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.timeout_ms)
    }

    pub fn execution_provider(&self) -> Result<ExecutionProvider> {
        self.models.provider.parse()
    }
}

/// Command line overrides, applied on top of the file configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Serial port of the motor controller
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub baud_rate: Option<u32>,
    /// Camera device index to capture from
    #[arg(long)]
    pub device: Option<i32>,
    /// Directory of frames to replay
    #[arg(long)]
    pub frames: Option<PathBuf>,
    #[arg(long)]
    pub warmup_frames: Option<usize>,
    /// Directory holding the ONNX models
    #[arg(long)]
    pub models: Option<PathBuf>,
    /// Execution provider: cpu, cuda[:id] or tensorrt[:id]
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub tick_period: Option<f64>,
    #[arg(long)]
    pub cruise_speed: Option<u8>,
    #[arg(long)]
    pub stop_duration: Option<f64>,
    #[arg(long)]
    pub cooldown_duration: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub min_steer: Option<i32>,
    #[arg(long)]
    pub max_steer: Option<i32>,
    #[arg(long)]
    pub person_width: Option<i32>,
    #[arg(long)]
    pub stop_sign_width: Option<i32>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut PilotConfig) {
        if let Some(port) = self.port {
            config.serial.port = port;
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(device) = self.device {
            config.camera.device = Some(device);
        }
        if let Some(frames) = self.frames {
            config.camera.frames = frames;
        }
        if let Some(warmup_frames) = self.warmup_frames {
            config.camera.warmup_frames = warmup_frames;
        }
        if let Some(models) = self.models {
            config.models.dir = models;
        }
        if let Some(provider) = self.provider {
            config.models.provider = provider;
        }
        if let Some(tick_period) = self.tick_period {
            config.timing.tick_period_secs = tick_period;
        }

        let decision = &mut config.decision;
        if let Some(cruise_speed) = self.cruise_speed {
            decision.cruise_speed = cruise_speed;
        }
        if let Some(stop_duration) = self.stop_duration {
            decision.stop_duration_secs = stop_duration;
        }
        if let Some(cooldown_duration) = self.cooldown_duration {
            decision.cooldown_duration_secs = cooldown_duration;
        }
        if let Some(min_steer) = self.min_steer {
            decision.min_steer = min_steer;
        }
        if let Some(max_steer) = self.max_steer {
            decision.max_steer = max_steer;
        }
        if let Some(person_width) = self.person_width {
            decision.person_width_px = person_width;
        }
        if let Some(stop_sign_width) = self.stop_sign_width {
            decision.stop_sign_width_px = stop_sign_width;
        }
    }
}
