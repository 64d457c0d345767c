use crate::{Frame, RGB};
use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::Path;

impl Frame {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Outlines the box `(x1, y1)`-`(x2, y2)` with a stroke of `thickness` pixels drawn inwards.
    /// Coordinates outside the frame are clipped.
    pub fn draw_box(&mut self, (x1, y1, x2, y2): (i32, i32, i32, i32), color: RGB, thickness: u32) {
        let (width, height) = self.get_size();
        if width == 0 || height == 0 {
            return;
        }
        let clip_x = |x: i32| x.clamp(0, width as i32 - 1) as u32;
        let clip_y = |y: i32| y.clamp(0, height as i32 - 1) as u32;
        let (left, right) = (clip_x(x1.min(x2)), clip_x(x1.max(x2)));
        let (top, bottom) = (clip_y(y1.min(y2)), clip_y(y1.max(y2)));
        let color: image::Rgb<u8> = color.into();

        for t in 0..thickness {
            let (l, r) = (left.saturating_add(t).min(right), right.saturating_sub(t).max(left));
            let (tp, bt) = (top.saturating_add(t).min(bottom), bottom.saturating_sub(t).max(top));
            for x in l..=r {
                self.put_pixel(x, tp, color);
                self.put_pixel(x, bt, color);
            }
            for y in tp..=bt {
                self.put_pixel(l, y, color);
                self.put_pixel(r, y, color);
            }
        }
    }

    /// Draws a full-height vertical line at column `x`; out-of-frame columns are ignored.
    pub fn draw_vertical_line(&mut self, x: u32, color: RGB) {
        if x >= self.get_width() {
            return;
        }
        let color: image::Rgb<u8> = color.into();
        for y in 0..self.get_height() {
            self.put_pixel(x, y, color);
        }
    }
}
