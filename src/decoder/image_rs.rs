use std::path::Path;

use image::DynamicImage;
use ndarray::{Array2, Array3};

use super::{ColorMode, ImageDecoder, ImageSize, PixelArray};
use crate::error::{KittiError, Result};

/// Pure-Rust decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRsDecoder;

impl ImageRsDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageRsDecoder {
    fn name(&self) -> &'static str {
        "image-rs"
    }

    fn decode(&self, path: &Path, mode: ColorMode) -> Result<PixelArray> {
        let img = image::open(path).map_err(|e| KittiError::decode(path, e))?;
        to_array(img, mode).map_err(|e| KittiError::decode(path, e))
    }

    fn dimensions(&self, path: &Path) -> Result<ImageSize> {
        let (width, height) = image::image_dimensions(path).map_err(|e| KittiError::decode(path, e))?;
        Ok(ImageSize::new(width, height))
    }
}

/// 16-bit and float images are narrowed to 8 bits with the same channel count.
fn to_array(img: DynamicImage, mode: ColorMode) -> std::result::Result<PixelArray, ndarray::ShapeError> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    if mode == ColorMode::Grayscale {
        let luma = if img.color().has_color() {
            img.into_rgb8().pixels().map(|p| rec601_luma(p.0)).collect()
        } else {
            img.into_luma8().into_raw()
        };
        return Ok(Array2::from_shape_vec((height, width), luma)?.into_dyn());
    }

    let (channels, raw) = match img.color().channel_count() {
        1 => return Ok(Array2::from_shape_vec((height, width), img.into_luma8().into_raw())?.into_dyn()),
        2 => (2, img.into_luma_alpha8().into_raw()),
        3 => (3, img.into_rgb8().into_raw()),
        _ => (4, img.into_rgba8().into_raw()),
    };
    Ok(Array3::from_shape_vec((height, width, channels), raw)?.into_dyn())
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
fn rec601_luma([r, g, b]: [u8; 3]) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}
