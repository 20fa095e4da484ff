use std::path::Path;

use ndarray::{Array2, Array3};
use opencv::core::{Mat, CV_8U};
use opencv::imgcodecs;
use opencv::imgproc::{COLOR_BGR2RGB, COLOR_BGRA2RGBA};
use opencv::prelude::*;

use super::{ColorMode, ImageDecoder, ImageSize, PixelArray};
use crate::error::{KittiError, Result};

/// Decoder backed by `cv::imread`. Color output is converted from BGR(A) to RGB(A) so both
/// backends return the same channel order.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpencvDecoder;

impl OpencvDecoder {
    pub fn new() -> Self {
        Self
    }

    fn read(path: &Path, flags: i32) -> Result<Mat> {
        let name = path
            .to_str()
            .ok_or_else(|| KittiError::decode(path, "path is not valid utf-8"))?;
        let img = imgcodecs::imread(name, flags).map_err(|e| KittiError::decode(path, e))?;
        // imread reports unreadable files with an empty Mat
        if img.rows() == 0 || img.cols() == 0 {
            return Err(KittiError::decode(path, "imread returned an empty image"));
        }
        Ok(img)
    }
}

impl ImageDecoder for OpencvDecoder {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn decode(&self, path: &Path, mode: ColorMode) -> Result<PixelArray> {
        let flags = match mode {
            ColorMode::Grayscale => imgcodecs::IMREAD_GRAYSCALE,
            ColorMode::Native => imgcodecs::IMREAD_UNCHANGED,
        };
        let img = Self::read(path, flags)?;
        if img.depth() != CV_8U {
            return Err(KittiError::decode(path, format!("unsupported depth {}", img.depth())));
        }

        let code = match img.channels() {
            3 => Some(COLOR_BGR2RGB),
            4 => Some(COLOR_BGRA2RGBA),
            _ => None,
        };
        let img = match code {
            Some(code) => {
                let mut converted = Mat::default();
                opencv::imgproc::cvt_color(&img, &mut converted, code, 0)
                    .map_err(|e| KittiError::decode(path, e))?;
                converted
            }
            None => img,
        };

        let (rows, cols, channels) = (img.rows() as usize, img.cols() as usize, img.channels() as usize);
        let data = img.data_bytes().map_err(|e| KittiError::decode(path, e))?.to_vec();
        let array = if channels == 1 {
            Array2::from_shape_vec((rows, cols), data).map(|a| a.into_dyn())
        } else {
            Array3::from_shape_vec((rows, cols, channels), data).map(|a| a.into_dyn())
        };
        array.map_err(|e| KittiError::decode(path, e))
    }

    fn dimensions(&self, path: &Path) -> Result<ImageSize> {
        let img = Self::read(path, imgcodecs::IMREAD_UNCHANGED)?;
        Ok(ImageSize::new(img.cols() as u32, img.rows() as u32))
    }
}
