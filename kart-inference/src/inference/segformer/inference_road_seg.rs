use crate::engine::inference_engine::{ExecutionProvider, OnnxSession};
use crate::inference::argmax;
use crate::inference::segformer::{ROAD_CLASS_ID, SEGFORMER_INPUT_SIZE};
use crate::inference::RoadEstimator;
use crate::utils::extractor::{ExtraToTensor, IMAGENET_MEAN, IMAGENET_STD};
use crate::utils::masks::RoadMask;
use anyhow::{ensure, Result};
use bitvec::prelude::*;
use kart_media::Frame;
use log::debug;
use ndarray::{s, ArrayView3, Axis, Ix4};
use ort::value::Tensor;
use rayon::prelude::*;
use std::path::Path;

pub const ROAD_MODEL_FILE: &str = "segformer_b0_ade_512.onnx";

pub struct RoadSegSession {
    session: OnnxSession,
    crop_fraction: f32,
}

impl RoadSegSession {
    /// `crop_fraction` is the share of frame rows, counted from the bottom, that may contribute
    /// to the road centre. Road far ahead is ignored when it is below 1.
    pub fn new(
        folder_path: impl AsRef<Path>,
        executor: ExecutionProvider,
        crop_fraction: f32,
    ) -> Result<Self> {
        Ok(Self {
            session: OnnxSession::new(folder_path.as_ref().join(ROAD_MODEL_FILE), executor)?,
            crop_fraction,
        })
    }

    /// Road mask at the resolution of `frame`.
    pub fn inference_road_mask(&self, frame: &Frame) -> Result<RoadMask> {
        let input = frame.resize_to((SEGFORMER_INPUT_SIZE, SEGFORMER_INPUT_SIZE));
        let tensor = Tensor::from_array(
            input.extra_normalized_image_to_tensor(IMAGENET_MEAN, IMAGENET_STD)?,
        )?;

        let outputs = self.session.run(ort::inputs![tensor]?)?;
        debug!("Finish running segmentation model");

        let logits = outputs["logits"]
            .try_extract_tensor::<f32>()?
            .into_dimensionality::<Ix4>()?;
        ensure!(
            logits.shape()[0] == 1 && logits.shape()[1] > ROAD_CLASS_ID,
            "unexpected segmentation output shape {:?}",
            logits.shape()
        );

        let mask = road_mask_from_logits(logits.index_axis(Axis(0), 0), ROAD_CLASS_ID)?;
        let (width, height) = frame.get_size();
        Ok(mask.resize_nearest(width, height))
    }

    pub fn find_road(&self, frame: &Frame) -> Result<Option<u8>> {
        let mask = self.inference_road_mask(frame)?;
        let center = mask.crop_bottom(self.crop_fraction).center_percentage();
        debug!("Road centre: {:?}", center);
        Ok(center)
    }
}

impl RoadEstimator for RoadSegSession {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<u8>> {
        self.find_road(frame)
    }
}

/// Marks every pixel of a `[classes, h, w]` logit map whose most likely class is `class_id`.
pub fn road_mask_from_logits(logits: ArrayView3<f32>, class_id: usize) -> Result<RoadMask> {
    let (_, height, width) = logits.dim();

    let rows = (0..height)
        .into_par_iter()
        .map(|y| {
            (0..width)
                .map(|x| {
                    argmax(logits.slice(s![.., y, x]).iter())
                        .is_some_and(|(class, _)| class == class_id)
                })
                .collect::<BitVec>()
        })
        .collect::<Vec<_>>();

    let mut bits = BitVec::with_capacity(width * height);
    for row in rows {
        bits.extend_from_bitslice(&row);
    }

    RoadMask::new(bits, width as u32, height as u32)
}
