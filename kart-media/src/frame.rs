use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use std::ops::{Deref, DerefMut};
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RGB(pub u8, pub u8, pub u8);

impl From<RGB> for image::Rgb<u8> {
    fn from(value: RGB) -> Self {
        image::Rgb([value.0, value.1, value.2])
    }
}

/// A single decoded camera frame, always held as packed RGB24.
#[derive(Debug, Clone)]
pub struct Frame(RgbImage);

impl Deref for Frame {
    type Target = RgbImage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<RgbImage> for Frame {
    fn from(value: RgbImage) -> Self {
        Self(value)
    }
}

impl Frame {
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        Ok(Self(image.to_rgb8()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("failed to decode image bytes")?;
        Ok(Self(image.to_rgb8()))
    }

    /// Wraps packed RGB24 data; `data.len()` must equal `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        anyhow::ensure!(
            data.len() == expected,
            "raw frame size mismatch: {} vs {}",
            data.len(),
            expected
        );
        RgbImage::from_raw(width, height, data)
            .map(Self)
            .context("raw frame buffer rejected")
    }

    /// Solid frame, mostly useful for fixtures and letterbox canvases.
    pub fn filled(width: u32, height: u32, color: RGB) -> Self {
        Self(RgbImage::from_pixel(width, height, color.into()))
    }

    pub fn get_size(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn get_width(&self) -> u32 {
        self.0.width()
    }

    pub fn get_height(&self) -> u32 {
        self.0.height()
    }

    pub fn raw_data(&self) -> &[u8] {
        self.0.as_raw()
    }

    pub fn into_inner(self) -> RgbImage {
        self.0
    }

    /// Stretches the frame to exactly `size`, ignoring aspect ratio.
    pub fn resize_to(&self, size: (u32, u32)) -> Frame {
        Frame(image::imageops::resize(&self.0, size.0, size.1, FilterType::Triangle))
    }

    /// Scales the frame to fit inside `target`x`target` keeping the aspect ratio and pads the
    /// remainder with `pad`, centering the content.
    ///
    /// Returns the new frame together with the applied scale and the (x, y) padding offsets.
    pub fn letterbox(&self, target: u32, pad: RGB) -> (Frame, f32, (u32, u32)) {
        let (width, height) = self.get_size();
        let scale = (target as f32 / width as f32).min(target as f32 / height as f32);
        let new_width = ((width as f32 * scale).round() as u32).clamp(1, target);
        let new_height = ((height as f32 * scale).round() as u32).clamp(1, target);

        let resized = image::imageops::resize(&self.0, new_width, new_height, FilterType::Triangle);
        let offset = ((target - new_width) / 2, (target - new_height) / 2);

        let mut canvas = RgbImage::from_pixel(target, target, pad.into());
        image::imageops::replace(&mut canvas, &resized, offset.0 as i64, offset.1 as i64);

        (Frame(canvas), scale, offset)
    }
}
