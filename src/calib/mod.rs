//! 标定文件解析
//!
//! KITTI calibration files are plain text, one `<key>: <v1> <v2> ... <vn>` entry per line,
//! e.g. `calib_cam_to_cam.txt`:
//!
//! ```text
//! K_00: 9.842439e+02 0.000000e+00 6.900000e+02 0.000000e+00 9.808141e+02 2.331966e+02 0.000000e+00 0.000000e+00 1.000000e+00
//! D_00: -3.728755e-01 2.037299e-01 2.219027e-03 1.383707e-03 -7.233722e-02
//! ```
//!
//! Values are reshaped purely by arity: 12 values are always a 3x4 matrix and 9 values always
//! a 3x3 matrix, whatever the key. Any other count stays a flat vector.

mod schema;

use std::collections::HashMap;
use std::path::Path;

use nalgebra::{Matrix3, Matrix3x4};
use serde::{Deserialize, Serialize};

use crate::config::CALIB_TIME_KEY;
use crate::error::{KittiError, Result};

/// Shape of a [`CalibValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibShape {
    Vector(usize),
    Matrix3x3,
    Matrix3x4,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalibValue {
    Vector(Vec<f64>),
    Matrix3x3(Matrix3<f64>),
    Matrix3x4(Matrix3x4<f64>),
}

impl CalibValue {
    /// Applies the arity rule to values given in file order.
    pub fn from_values(values: Vec<f64>) -> Self {
        match values.len() {
            12 => Self::Matrix3x4(Matrix3x4::from_row_slice(&values)),
            9 => Self::Matrix3x3(Matrix3::from_row_slice(&values)),
            _ => Self::Vector(values),
        }
    }

    pub fn shape(&self) -> CalibShape {
        match self {
            Self::Vector(v) => CalibShape::Vector(v.len()),
            Self::Matrix3x3(_) => CalibShape::Matrix3x3,
            Self::Matrix3x4(_) => CalibShape::Matrix3x4,
        }
    }

    /// Number of scalars, matrices included.
    pub fn len(&self) -> usize {
        match self {
            Self::Vector(v) => v.len(),
            Self::Matrix3x3(_) => 9,
            Self::Matrix3x4(_) => 12,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_matrix(&self) -> bool {
        !matches!(self, Self::Vector(_))
    }

    /// Values in the order they appeared in the file.
    pub fn to_row_major(&self) -> Vec<f64> {
        match self {
            Self::Vector(v) => v.clone(),
            // nalgebra is column-major, the transpose's storage is our row order
            Self::Matrix3x3(m) => m.transpose().as_slice().to_vec(),
            Self::Matrix3x4(m) => m.transpose().as_slice().to_vec(),
        }
    }

    /// Matrix element, `None` for vectors and out-of-bounds positions.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            Self::Vector(_) => None,
            Self::Matrix3x3(m) => m.get((row, col)).copied(),
            Self::Matrix3x4(m) => m.get((row, col)).copied(),
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }
}

/// Parsed calibration file: key (colon included, e.g. `"K_00:"`) to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationRecord {
    values: HashMap<String, CalibValue>,
}

impl CalibrationRecord {
    pub fn get(&self, key: &str) -> Option<&CalibValue> {
        self.values.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&CalibValue> {
        self.values.get(key).ok_or_else(|| KittiError::KeyNotFound {
            key: key.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CalibValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parser knobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibParseOptions {
    /// Keys dropped before their values are converted to numbers.
    pub skip_keys: Vec<String>,
}

impl CalibParseOptions {
    /// Skips the `calib_time:` date line found at the top of raw-data calibration files.
    pub fn kitti_raw() -> Self {
        Self {
            skip_keys: vec![CALIB_TIME_KEY.to_string()],
        }
    }
}

/// Parses a calibration file. Every line must be numeric.
pub fn parse(path: &Path) -> Result<CalibrationRecord> {
    parse_with(path, &CalibParseOptions::default())
}

pub fn parse_with(path: &Path, options: &CalibParseOptions) -> Result<CalibrationRecord> {
    let text = std::fs::read_to_string(path).map_err(|e| KittiError::io(path, e))?;
    let record = parse_text(&text, path, options)?;
    log::debug!(
        "parsed {} calibration entries from {}",
        record.len(),
        path.display()
    );
    Ok(record)
}

/// `path` is only used in error messages.
pub(crate) fn parse_text(
    text: &str,
    path: &Path,
    options: &CalibParseOptions,
) -> Result<CalibrationRecord> {
    let mut values = HashMap::new();

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        if !key.ends_with(':') {
            return Err(KittiError::parse(
                path,
                line_no,
                format!("key '{key}' does not end with ':'"),
            ));
        }
        if options.skip_keys.iter().any(|k| k == key) {
            continue;
        }

        let numbers = tokens
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    KittiError::parse(
                        path,
                        line_no,
                        format!("value '{token}' of '{key}' is not a number"),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if numbers.is_empty() {
            return Err(KittiError::parse(
                path,
                line_no,
                format!("'{key}' has no values"),
            ));
        }

        let value = CalibValue::from_values(numbers);
        check_shape(key, &value);
        if values.insert(key.to_string(), value).is_some() {
            log::debug!("duplicate calibration key {key} at line {line_no}, keeping the last one");
        }
    }

    Ok(CalibrationRecord { values })
}

fn check_shape(key: &str, value: &CalibValue) {
    match schema::documented_shape(key) {
        Some(expected) if expected != value.shape() => {
            log::warn!(
                "calibration key {key} is documented as {expected:?} but has {} values, stored as {:?}",
                value.len(),
                value.shape()
            );
        }
        None if value.is_matrix() => {
            log::warn!(
                "unknown calibration key {key} with {} values inferred as {:?}",
                value.len(),
                value.shape()
            );
        }
        _ => {}
    }
}
