//! Image preprocessing for the jean classifier.
//!
//! Decode (PNG/JPEG/BMP/GIF) → RGB → 224×224 bilinear resize → divide by 255
//! → batch of one, NHWC.

use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::model::ImageBatch;

/// Side length of the square image the model consumes.
pub const INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Converts to 3-channel RGB and resizes to `INPUT_SIZE × INPUT_SIZE`.
pub fn resize_rgb(image: &DynamicImage) -> RgbImage {
    let rgb = image.to_rgb8();
    image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
}

/// Scales every channel to [0, 1] and adds the batch dimension.
pub fn normalize(rgb: &RgbImage) -> ImageBatch {
    let data: Vec<f64> = rgb.as_raw().iter().map(|&c| c as f64 / 255.0).collect();
    ImageBatch::single(rgb.height() as usize, rgb.width() as usize, CHANNELS, data)
}

pub fn to_batch(image: &DynamicImage) -> ImageBatch {
    normalize(&resize_rgb(image))
}
