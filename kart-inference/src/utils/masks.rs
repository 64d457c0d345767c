use anyhow::{ensure, Result};
use bitvec::prelude::*;
use kart_media::{Frame, RGB};
use rayon::prelude::*;

/// Row-major binary mask, one bit per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadMask {
    bits: BitVec,
    width: u32,
    height: u32,
}

impl RoadMask {
    pub fn new(bits: BitVec, width: u32, height: u32) -> Result<Self> {
        ensure!(
            bits.len() == width as usize * height as usize,
            "Mask length mismatch: {} vs {}",
            bits.len(),
            width as usize * height as usize
        );
        Ok(Self { bits, width, height })
    }

    pub fn from_fn(width: u32, height: u32, is_road: impl Fn(u32, u32) -> bool) -> Self {
        let bits = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| is_road(x, y))
            .collect::<BitVec>();
        Self { bits, width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits(&self) -> &BitSlice {
        &self.bits
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.bits[(y * self.width + x) as usize]
    }

    /// Nearest-neighbour rescale: destination pixel `(x, y)` samples
    /// `(x * src_w / dst_w, y * src_h / dst_h)`.
    pub fn resize_nearest(&self, width: u32, height: u32) -> RoadMask {
        if self.width == 0 || self.height == 0 {
            return RoadMask::from_fn(width, height, |_, _| false);
        }
        let (src_w, src_h) = (self.width as u64, self.height as u64);
        let (dst_w, dst_h) = (width as u64, height as u64);

        let rows = (0..height)
            .into_par_iter()
            .map(|y| {
                let src_y = ((y as u64 * src_h) / dst_h).min(src_h - 1);
                let src_row = &self.bits[(src_y * src_w) as usize..((src_y + 1) * src_w) as usize];
                (0..dst_w)
                    .map(|x| src_row[((x * src_w) / dst_w).min(src_w - 1) as usize])
                    .collect::<BitVec>()
            })
            .collect::<Vec<_>>();

        let mut bits = BitVec::with_capacity(width as usize * height as usize);
        for row in rows {
            bits.extend_from_bitslice(&row);
        }
        RoadMask { bits, width, height }
    }

    /// Keeps only the bottom `fraction` of rows, i.e. the part of the road closest to the kart.
    pub fn crop_bottom(&self, fraction: f32) -> RoadMask {
        let keep = ((self.height as f32 * fraction.clamp(0.0, 1.0)) as u32).min(self.height);
        let start = ((self.height - keep) * self.width) as usize;
        RoadMask {
            bits: self.bits[start..].to_bitvec(),
            width: self.width,
            height: keep,
        }
    }

    /// Zeroth and first horizontal moments `(m00, m10)` of the mask.
    pub fn moments(&self) -> (u64, u64) {
        if self.width == 0 {
            return (0, 0);
        }
        let width = self.width as usize;
        (0..self.height as usize)
            .into_par_iter()
            .map(|y| {
                self.bits[y * width..(y + 1) * width]
                    .iter_ones()
                    .fold((0u64, 0u64), |(m00, m10), x| (m00 + 1, m10 + x as u64))
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    }

    /// Horizontal centroid as a whole percentage of the mask width, `None` without road pixels.
    pub fn center_percentage(&self) -> Option<u8> {
        let (m00, m10) = self.moments();
        if m00 == 0 {
            return None;
        }
        let center_x = m10 / m00;
        let percentage = (center_x as f64 / self.width as f64 * 100.0) as u64;
        Some(percentage.min(100) as u8)
    }
}

pub trait ApplyMask {
    fn layering_mask(&mut self, mask: &RoadMask, apply_color: RGB) -> Result<()>;
}

impl ApplyMask for Frame {
    /// Brightens every masked pixel by `apply_color`, saturating per channel.
    fn layering_mask(&mut self, mask: &RoadMask, apply_color: RGB) -> Result<()> {
        ensure!(
            self.get_size() == (mask.width(), mask.height()),
            "mask size {:?} does not match frame size {:?}",
            (mask.width(), mask.height()),
            self.get_size()
        );
        let tint = [apply_color.0, apply_color.1, apply_color.2];
        let bits = mask.bits();

        self.par_chunks_mut(3)
            .enumerate()
            .filter(|(index, _)| bits[*index])
            .for_each(|(_, pixel)| {
                for (channel, add) in pixel.iter_mut().zip(tint) {
                    *channel = channel.saturating_add(add);
                }
            });

        Ok(())
    }
}
