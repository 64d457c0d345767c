use crate::source::FrameSource;
use crate::Frame;
use anyhow::{bail, ensure, Context, Result};
use log::{info, warn};
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

/// Live frames from a capture device, converted from BGR to RGB.
pub struct Camera {
    device: i32,
    capture: Option<VideoCapture>,
}

impl Camera {
    pub fn open(device: i32) -> Result<Self> {
        let capture = VideoCapture::new(device, videoio::CAP_ANY)
            .with_context(|| format!("cannot open camera {}", device))?;
        ensure!(capture.is_opened()?, "camera {} did not open", device);

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        info!("Opened camera {} at {}x{}", device, width, height);

        Ok(Self {
            device,
            capture: Some(capture),
        })
    }

    pub fn device(&self) -> i32 {
        self.device
    }
}

impl FrameSource for Camera {
    fn capture(&mut self) -> Result<Frame> {
        let Some(capture) = self.capture.as_mut() else {
            bail!("camera {} was released", self.device);
        };

        let mut bgr = Mat::default();
        if !capture.read(&mut bgr)? || bgr.empty() {
            bail!("camera {} returned no frame", self.device);
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        Frame::from_raw(width, height, rgb.data_bytes()?.to_vec())
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(err) = capture.release() {
                warn!("Failed to release camera {}: {}", self.device, err);
            }
        }
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.release();
    }
}
