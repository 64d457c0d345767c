pub mod encoder;
pub mod frame;
pub mod source;

pub use frame::{Frame, RGB};
pub use source::image_sequence::ImageSequence;
pub use source::FrameSource;

#[cfg(feature = "camera")]
pub use source::camera::Camera;
