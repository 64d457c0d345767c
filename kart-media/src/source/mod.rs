use crate::Frame;
use anyhow::Result;
use log::{debug, warn};

#[cfg(feature = "camera")]
pub mod camera;
pub mod image_sequence;

/// Anything that can hand out frames one at a time.
///
/// A failed capture is terminal for the caller: the control loop stops on the first error.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame>;

    /// Discards up to `frames` captures so exposure and focus can settle.
    /// Returns how many frames were actually read before the source failed, if it did.
    fn warm_up(&mut self, frames: usize) -> usize {
        for read in 0..frames {
            if let Err(err) = self.capture() {
                warn!("Frame source failed during warm-up after {read} frames: {err:#}");
                return read;
            }
        }
        debug!("Warm-up finished after {frames} frames");
        frames
    }

    fn release(&mut self) {}
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn capture(&mut self) -> Result<Frame> {
        (**self).capture()
    }

    fn warm_up(&mut self, frames: usize) -> usize {
        (**self).warm_up(frames)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
