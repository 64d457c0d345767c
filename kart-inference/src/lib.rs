pub mod engine;
pub mod inference;
pub mod utils;

pub use inference::detection::{BoundingBox, CocoClass, Detection};
pub use inference::{ObjectDetector, RoadEstimator};
