//! Aspect-preserving resize with centered padding.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// How a source image was placed inside the network input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LetterboxInfo {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    /// Uniform factor applied to the source.
    pub scale: f32,
    /// Padding columns left of the resized image.
    pub pad_left: u32,
    /// Padding rows above the resized image.
    pub pad_top: u32,
}

impl LetterboxInfo {
    /// Computes the placement of a `source` sized image in a `target` sized
    /// input: scale by `min(tw / sw, th / sh)`, then center. Odd leftover
    /// padding goes to the right and bottom.
    pub fn compute(source_width: u32, source_height: u32, target_width: u32, target_height: u32) -> Self {
        let scale = if source_width == 0 || source_height == 0 {
            1.0
        } else {
            (target_width as f32 / source_width as f32)
                .min(target_height as f32 / source_height as f32)
        };
        let (resized_width, resized_height) = resized_dims(source_width, source_height, scale);
        Self {
            source_width,
            source_height,
            target_width,
            target_height,
            scale,
            pad_left: target_width.saturating_sub(resized_width) / 2,
            pad_top: target_height.saturating_sub(resized_height) / 2,
        }
    }

    /// Size of the source after scaling, before padding.
    pub fn resized_size(&self) -> (u32, u32) {
        resized_dims(self.source_width, self.source_height, self.scale)
    }

    /// Maps a point in network-input coordinates back to the source image.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_left as f32) / self.scale,
            (y - self.pad_top as f32) / self.scale,
        )
    }

    /// Maps a source-image point into network-input coordinates.
    pub fn to_input(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.pad_left as f32 + x * self.scale,
            self.pad_top as f32 + y * self.scale,
        )
    }

    /// Maps a length in network-input pixels back to source pixels.
    pub fn length_to_source(&self, length: f32) -> f32 {
        length / self.scale
    }
}

fn resized_dims(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        (width as f32 * scale) as u32,
        (height as f32 * scale) as u32,
    )
}

/// Letterboxes `source` into a `target_width x target_height` image padded
/// with the gray level `pad_value`.
pub fn letterbox(
    source: &RgbImage,
    target_width: u32,
    target_height: u32,
    pad_value: u8,
) -> (RgbImage, LetterboxInfo) {
    let info = LetterboxInfo::compute(source.width(), source.height(), target_width, target_height);
    let mut canvas = RgbImage::from_pixel(target_width, target_height, Rgb([pad_value; 3]));

    let (resized_width, resized_height) = info.resized_size();
    if resized_width > 0 && resized_height > 0 {
        let resized = imageops::resize(source, resized_width, resized_height, FilterType::Triangle);
        imageops::overlay(
            &mut canvas,
            &resized,
            i64::from(info.pad_left),
            i64::from(info.pad_top),
        );
    }

    (canvas, info)
}
