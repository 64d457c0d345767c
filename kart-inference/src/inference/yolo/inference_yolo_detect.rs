use crate::engine::inference_engine::{ExecutionProvider, OnnxSession};
use crate::inference::argmax;
use crate::inference::detection::{BoundingBox, CocoClass, Detection};
use crate::inference::yolo::{NMSImplement, YoloCandidate};
use crate::inference::ObjectDetector;
use crate::utils::extractor::ExtraToTensor;
use anyhow::{ensure, Result};
use kart_media::{Frame, RGB};
use log::debug;
use ndarray::{s, ArrayView2, Axis, Ix3};
use ort::value::Tensor;
use rayon::prelude::*;
use std::path::Path;

pub const YOLO_MODEL_FILE: &str = "yolov8n.onnx";
pub const YOLO_INPUT_SIZE: u32 = 640;
const LETTERBOX_PAD: RGB = RGB(114, 114, 114);
const MAX_DETECTIONS: usize = 300;

/// Where a letterboxed model input sits inside the original frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub offset: (u32, u32),
    pub frame_size: (u32, u32),
}

pub struct YoloDetectSession {
    session: OnnxSession,
    confidence: f32,
    iou_threshold: f32,
}

impl YoloDetectSession {
    pub fn new(
        folder_path: impl AsRef<Path>,
        executor: ExecutionProvider,
        confidence: f32,
        iou_threshold: f32,
    ) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::new(folder_path.as_ref().join(YOLO_MODEL_FILE), executor)?,
            confidence,
            iou_threshold,
        })
    }

    pub fn inference_yolo(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let (input, scale, offset) = frame.letterbox(YOLO_INPUT_SIZE, LETTERBOX_PAD);
        let letterbox = Letterbox {
            scale,
            offset,
            frame_size: frame.get_size(),
        };

        let tensor = Tensor::from_array(input.extra_standard_image_to_tensor()?)?;
        debug!("Finish copying tensor");
        let outputs = self.session.run(ort::inputs![tensor]?)?;
        debug!("Finish running model");

        let output = outputs["output0"]
            .try_extract_tensor::<f32>()?
            .into_dimensionality::<Ix3>()?;
        ensure!(
            output.shape()[0] == 1 && output.shape()[1] > 4,
            "unexpected detector output shape {:?}",
            output.shape()
        );

        let candidates = decode_candidates(output.index_axis(Axis(0), 0), self.confidence)
            .non_maximum_suppression(self.iou_threshold);
        debug!("{} candidates survived suppression", candidates.len());

        into_detections(candidates, letterbox)
    }
}

impl ObjectDetector for YoloDetectSession {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        self.inference_yolo(frame)
    }
}

/// Decodes a `[4 + classes, proposals]` output into the proposals whose best class score is
/// above `confidence`.
pub fn decode_candidates(output: ArrayView2<f32>, confidence: f32) -> Vec<YoloCandidate> {
    output
        .t()
        .axis_iter(Axis(0))
        .into_par_iter()
        .filter_map(|box_output| {
            let (class_index, score) = argmax(box_output.slice(s![4..]).iter())?;
            (score > confidence).then(|| YoloCandidate {
                class_index,
                score,
                x: box_output[0],
                y: box_output[1],
                width: box_output[2],
                height: box_output[3],
            })
        })
        .collect()
}

/// Maps surviving proposals back into frame pixels, keeping only the road-relevant COCO classes.
pub fn into_detections(candidates: Vec<YoloCandidate>, letterbox: Letterbox) -> Result<Vec<Detection>> {
    let (frame_width, frame_height) = letterbox.frame_size;
    let unpad_x = |x: f32| {
        ((x - letterbox.offset.0 as f32) / letterbox.scale).clamp(0.0, frame_width as f32) as i32
    };
    let unpad_y = |y: f32| {
        ((y - letterbox.offset.1 as f32) / letterbox.scale).clamp(0.0, frame_height as f32) as i32
    };

    let mut detections = Vec::new();
    for candidate in candidates.into_iter().take(MAX_DETECTIONS) {
        let Ok(class) = CocoClass::try_from(candidate.class_index) else {
            continue;
        };

        let (x1, y1, x2, y2) = candidate.corners();
        let (x1, y1, x2, y2) = (unpad_x(x1), unpad_y(y1), unpad_x(x2), unpad_y(y2));
        if x1 >= x2 || y1 >= y2 {
            debug!("Dropping {} collapsed to ({x1}, {y1}, {x2}, {y2})", class);
            continue;
        }

        let confidence = ((candidate.score * 100.0).round() / 100.0).clamp(0.0, 1.0);
        detections.push(Detection::new(
            class.name(),
            confidence,
            BoundingBox::new(x1, y1, x2, y2)?,
        )?);
    }

    Ok(detections)
}
