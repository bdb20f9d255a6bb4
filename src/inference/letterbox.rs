//! Aspect-preserving resize with padding to the model input square.

use crate::constants::pose::LETTERBOX_FILL;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Mapping between source pixels and letterboxed model-input pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale applied to the source image.
    pub gain: f32,
    /// Size of the scaled image inside the square.
    pub scaled: (u32, u32),
    /// Left and top padding in model pixels.
    pub pad: (u32, u32),
    /// Source frame size.
    pub source: (u32, u32),
}

impl Letterbox {
    /// Compute the mapping for a `width` x `height` source and a square input of `size`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(width: u32, height: u32, size: u32) -> Self {
        let gain = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_w = ((width as f32 * gain).round() as u32).clamp(1, size);
        let new_h = ((height as f32 * gain).round() as u32).clamp(1, size);
        Self {
            gain,
            scaled: (new_w, new_h),
            pad: ((size - new_w) / 2, (size - new_h) / 2),
            source: (width, height),
        }
    }

    /// Map a model-space point back to source pixels, clamped to the frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn restore_point(&self, x: f32, y: f32) -> [f32; 2] {
        [
            ((x - self.pad.0 as f32) / self.gain).clamp(0.0, self.source.0 as f32),
            ((y - self.pad.1 as f32) / self.gain).clamp(0.0, self.source.1 as f32),
        ]
    }

    /// Map a model-space box back to source pixels, clamped to the frame.
    pub fn restore_box(&self, b: &[f32; 4]) -> [f32; 4] {
        let [x1, y1] = self.restore_point(b[0], b[1]);
        let [x2, y2] = self.restore_point(b[2], b[3]);
        [x1, y1, x2, y2]
    }
}

/// Resize `frame` into a `size` x `size` square, padding with grey.
pub fn letterbox(frame: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let mapping = Letterbox::new(frame.width(), frame.height(), size);
    let (new_w, new_h) = mapping.scaled;

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([LETTERBOX_FILL; 3]));
    if (new_w, new_h) == frame.dimensions() {
        imageops::replace(
            &mut canvas,
            frame,
            i64::from(mapping.pad.0),
            i64::from(mapping.pad.1),
        );
    } else {
        let resized = imageops::resize(frame, new_w, new_h, FilterType::Triangle);
        imageops::replace(
            &mut canvas,
            &resized,
            i64::from(mapping.pad.0),
            i64::from(mapping.pad.1),
        );
    }
    (canvas, mapping)
}

/// Convert an RGB image into a normalized planar `[3, H, W]` buffer.
pub fn to_chw(image: &RgbImage) -> Vec<f32> {
    let plane = image.width() as usize * image.height() as usize;
    let mut data = vec![0.0f32; plane * 3];
    for (i, pixel) in image.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = f32::from(pixel[c]) / 255.0;
        }
    }
    data
}
