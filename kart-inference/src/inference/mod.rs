use crate::inference::detection::Detection;
use anyhow::Result;
use kart_media::Frame;

pub mod detection;
pub mod segformer;
pub mod yolo;

/// Produces the obstacle/sign detections of one frame.
pub trait ObjectDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Produces the horizontal road centre of one frame as a percentage of its width, if any road
/// is visible at all.
pub trait RoadEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<u8>>;
}

impl<T: ObjectDetector + ?Sized> ObjectDetector for Box<T> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}

impl<T: RoadEstimator + ?Sized> RoadEstimator for Box<T> {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<u8>> {
        (**self).estimate(frame)
    }
}

/// Index and value of the largest element; ties keep the first index.
pub(crate) fn argmax<'a>(values: impl IntoIterator<Item = &'a f32>) -> Option<(usize, f32)> {
    values
        .into_iter()
        .enumerate()
        .fold(None, |best, (index, &value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((index, value)),
        })
}
