use anyhow::Result;
use kart_media::Frame;
use ndarray::Array4;
use rayon::prelude::*;

/// Per-channel ImageNet statistics used by the segmentation model.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub trait ExtraToTensor {
    /// Planar `[1, 3, h, w]` tensor with every channel scaled to `[0, 1]`.
    fn extra_standard_image_to_tensor(&self) -> Result<Array4<f32>>;

    /// Planar `[1, 3, h, w]` tensor scaled to `[0, 1]` and then normalised per channel.
    fn extra_normalized_image_to_tensor(&self, mean: [f32; 3], std: [f32; 3]) -> Result<Array4<f32>>;
}

impl ExtraToTensor for Frame {
    fn extra_standard_image_to_tensor(&self) -> Result<Array4<f32>> {
        self.extra_normalized_image_to_tensor([0.0; 3], [1.0; 3])
    }

    fn extra_normalized_image_to_tensor(&self, mean: [f32; 3], std: [f32; 3]) -> Result<Array4<f32>> {
        let (width, height) = self.get_size();
        let plane = (width * height) as usize;
        let raw = self.raw_data();

        let mut tensor = vec![0f32; plane * 3];
        tensor
            .par_chunks_mut(plane.max(1))
            .enumerate()
            .for_each(|(channel, values)| {
                for (value, pixel) in values.iter_mut().zip(raw.chunks_exact(3)) {
                    *value = (pixel[channel] as f32 / 255. - mean[channel]) / std[channel];
                }
            });

        Ok(Array4::from_shape_vec(
            (1, 3, height as usize, width as usize),
            tensor,
        )?)
    }
}
