use std::path::Path;

use anyhow::Context;
use nalgebra::{Matrix3, Point2, Point3};
use serde::{Deserialize, Serialize};

use super::{calib_key, intrinsic_key};
use crate::calib::{CalibValue, CalibrationRecord};
use crate::decoder::ImageSize;
use crate::error::{KittiError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PinholeParameters {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl PinholeParameters {
    /// Reads `(0,0)`, `(1,1)`, `(0,2)` and `(1,2)` of a 3x3 or 3x4 camera matrix.
    pub fn from_camera_matrix(key: &str, matrix: &CalibValue) -> Result<Self> {
        let at = |row, col| {
            matrix.get(row, col).ok_or_else(|| KittiError::NotAMatrix {
                key: key.to_string(),
                len: matrix.len(),
            })
        };
        Ok(Self {
            fx: at(0, 0)?,
            fy: at(1, 1)?,
            cx: at(0, 2)?,
            cy: at(1, 2)?,
        })
    }

    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    /// 像素坐标反投影到归一化平面 (z = 1)
    pub fn lift_projective(&self, p: &Point2<f64>) -> Point3<f64> {
        let x = (p.x - self.cx) / self.fx;
        let y = (p.y - self.cy) / self.fy;
        Point3::new(x, y, 1.0)
    }
}

/// Unrectified camera as described by the `K_`, `D_` and `S_` keys of one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinholeCamera {
    pub camera_name: String,
    pub image_size: Option<ImageSize>,
    pub parameters: PinholeParameters,
    /// k1, k2, p1, p2, k3
    pub distortion: Option<[f64; 5]>,
}

impl PinholeCamera {
    pub fn from_calibration(record: &CalibrationRecord, camera: u32) -> Result<Self> {
        let key = intrinsic_key(camera)?;
        let parameters = PinholeParameters::from_camera_matrix(&key, record.require(&key)?)?;

        let distortion = match record.get(&calib_key("D_0", camera)?).and_then(CalibValue::as_vector) {
            Some(&[k1, k2, p1, p2, k3]) => Some([k1, k2, p1, p2, k3]),
            Some(other) => {
                log::warn!("ignoring distortion of camera {camera} with {} coefficients", other.len());
                None
            }
            None => None,
        };

        let image_size = match record.get(&calib_key("S_0", camera)?).and_then(CalibValue::as_vector) {
            Some(&[width, height]) => Some(ImageSize::new(width.round() as u32, height.round() as u32)),
            _ => None,
        };

        Ok(Self {
            camera_name: format!("image_{camera:02}"),
            image_size,
            parameters,
            distortion,
        })
    }

    pub fn has_distortion(&self) -> bool {
        self.distortion
            .map(|d| d.iter().any(|c| *c != 0.0))
            .unwrap_or(false)
    }

    pub fn read_from_json(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read camera {}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn write_to_json(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("write camera {}", path.display()))?;
        Ok(())
    }
}
