use crate::config::PilotConfig;
use anyhow::Result;
use kart_media::{FrameSource, ImageSequence};
use kart_inference::inference::segformer::inference_road_seg::RoadSegSession;
use kart_inference::inference::yolo::inference_yolo_detect::YoloDetectSession;
use kart_inference::utils::masks::{ApplyMask, RoadMask};
use kart_inference::{CocoClass, Detection};
use kart_media::{Frame, RGB};
use log::{info, warn};
use std::path::Path;

const BOX_THICKNESS: u32 = 2;
const ROAD_TINT: RGB = RGB(0, 60, 0);
const ROAD_CENTER_COLOR: RGB = RGB(255, 255, 0);

pub fn open_detector(config: &PilotConfig) -> Result<YoloDetectSession> {
    YoloDetectSession::new(
        &config.models.dir,
        config.execution_provider()?,
        config.models.detect_confidence,
        config.models.detect_iou,
    )
}

pub fn open_road_estimator(config: &PilotConfig) -> Result<RoadSegSession> {
    RoadSegSession::new(
        &config.models.dir,
        config.execution_provider()?,
        config.models.road_crop_fraction,
    )
}

/// Opens the configured camera, or the frame directory when no device is set, and warms it up.
pub fn open_frame_source(config: &PilotConfig) -> Result<Box<dyn FrameSource>> {
    let mut source: Box<dyn FrameSource> = match config.camera.device {
        Some(device) => open_camera(device)?,
        None => Box::new(ImageSequence::open(
            &config.camera.frames,
            config.camera.looping,
        )?),
    };

    let wanted = config.camera.warmup_frames;
    if wanted > 0 {
        info!("Warming up camera...");
        let read = source.warm_up(wanted);
        if read < wanted {
            warn!("Warm-up stopped after {} of {} frames", read, wanted);
        }
    }
    Ok(source)
}

#[cfg(feature = "camera")]
fn open_camera(device: i32) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(kart_media::Camera::open(device)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(device: i32) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "camera {} requested but kart-pilot was built without the `camera` feature",
        device
    )
}

fn box_color(detection: &Detection) -> RGB {
    if detection.is(CocoClass::Person) {
        RGB(255, 0, 0)
    } else if detection.is(CocoClass::StopSign) {
        RGB(0, 0, 255)
    } else {
        RGB(0, 255, 0)
    }
}

/// Draws the detection boxes, the road mask and the road centre line onto `frame`.
/// Labels are not rendered; callers log them.
pub fn annotate(
    frame: &mut Frame,
    detections: &[Detection],
    road_mask: Option<&RoadMask>,
    road_center: Option<u8>,
) -> Result<()> {
    if let Some(mask) = road_mask {
        frame.layering_mask(mask, ROAD_TINT)?;
    }
    for detection in detections {
        frame.draw_box(
            detection.bounding_box.corners(),
            box_color(detection),
            BOX_THICKNESS,
        );
    }
    if let Some(center) = road_center {
        let x = (frame.get_width() as u64 * center as u64 / 100) as u32;
        frame.draw_vertical_line(x.min(frame.get_width().saturating_sub(1)), ROAD_CENTER_COLOR);
    }
    Ok(())
}

pub fn detect_image(config: &PilotConfig, image: &Path) -> Result<Vec<Detection>> {
    let detector = open_detector(config)?;
    let frame = Frame::open_file(image)?;
    let detections = detector.inference_yolo(&frame)?;

    println!("Detections in {}:", image.display());
    for detection in &detections {
        println!("  {}", detection);
    }
    Ok(detections)
}

pub fn road_image(config: &PilotConfig, image: &Path) -> Result<Option<u8>> {
    let estimator = open_road_estimator(config)?;
    let frame = Frame::open_file(image)?;
    let center = estimator.find_road(&frame)?;

    match center {
        Some(center) => println!("Road center percentage: {}%", center),
        None => println!("No road found in {}", image.display()),
    }
    Ok(center)
}

pub fn visualize(config: &PilotConfig, image: &Path, output: &Path) -> Result<()> {
    let detector = open_detector(config)?;
    let estimator = open_road_estimator(config)?;
    let mut frame = Frame::open_file(image)?;

    let detections = detector.inference_yolo(&frame)?;
    let mask = estimator.inference_road_mask(&frame)?;
    let center = mask
        .crop_bottom(config.models.road_crop_fraction)
        .center_percentage();

    for detection in &detections {
        info!("{}", detection);
    }
    annotate(&mut frame, &detections, Some(&mask), center)?;
    frame.save(output)?;
    info!("Saved annotated frame to {}", output.display());
    Ok(())
}
