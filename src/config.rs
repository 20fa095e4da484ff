use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::calib::CalibParseOptions;

/// 图像文件扩展名
pub const IMAGE_EXTENSION: &str = "png";
/// 内参矩阵的标定键前缀, 完整的键是 `K_0<id>:`
pub const INTRINSIC_KEY_PREFIX: &str = "K_0";
/// `K_0N:` 只能表示一位数的相机编号
pub const MAX_SEQUENCE_ID: u32 = 9;
/// KITTI raw 时间戳格式, e.g. `2011-09-26 13:02:25.964389445`
pub const KITTI_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// 标定文件中唯一的非数值行
pub const CALIB_TIME_KEY: &str = "calib_time:";

/// Runtime knobs of [`crate::KittiSequence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    pub image_extension: String,
    /// Fail construction when image and timestamp counts differ.
    pub validate_timestamps: bool,
    /// Fail construction on image names that are not zero-padded frame numbers.
    pub validate_filenames: bool,
    pub calib: CalibParseOptions,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            image_extension: IMAGE_EXTENSION.to_string(),
            validate_timestamps: true,
            validate_filenames: true,
            calib: CalibParseOptions::default(),
        }
    }
}

/// One sequence on disk, as read by the `kitti-loader` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub image_dir: PathBuf,
    pub calib_path: PathBuf,
    pub timestamps_path: PathBuf,
    #[serde(default)]
    pub grayscale: bool,
    #[serde(default)]
    pub options: SequenceOptions,
}

impl DatasetConfig {
    pub fn read_from_json(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }
}
