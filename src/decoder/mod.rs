//! 图像解码
//!
//! The accessor never touches pixels itself. It hands a path and a [`ColorMode`] to an
//! [`ImageDecoder`] and returns whatever array comes back. Decoders do not cache: every call
//! reads the file again. Wrap a decoder to add caching.

mod image_rs;
#[cfg(feature = "opencv")]
mod cv;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use image_rs::ImageRsDecoder;
#[cfg(feature = "opencv")]
pub use cv::OpencvDecoder;

/// Decoded 8-bit pixels, row-major `[height, width]` or `[height, width, channels]`.
///
/// Always `u8`. 16-bit and float images (e.g. 16-bit depth PNGs) are narrowed to 8 bits on
/// decode, so their full-precision values are not available through this type.
pub type PixelArray = ndarray::ArrayD<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Keep the channel count stored in the file.
    Native,
    /// Single channel luma, ITU-R 601-2 weights (0.299 R + 0.587 G + 0.114 B).
    Grayscale,
}

impl ColorMode {
    pub fn from_grayscale(grayscale: bool) -> Self {
        if grayscale {
            Self::Grayscale
        } else {
            Self::Native
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

pub trait ImageDecoder: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    fn decode(&self, path: &Path, mode: ColorMode) -> Result<PixelArray>;

    /// Size of the image without decoding its pixels where the backend allows it.
    fn dimensions(&self, path: &Path) -> Result<ImageSize>;
}

/// Decoder used when none is injected.
pub type DefaultDecoder = ImageRsDecoder;
