//! 数据集处理
//!
//! KITTI raw data  https://www.cvlibs.net/datasets/kitti/raw_data.php
mod kitti;
mod timestamps;

pub use kitti::{Frame, Frames, KittiSequence};
pub use timestamps::{Timestamp, TimestampTable};

use crate::error::Result;

pub type DefaultDataset = KittiSequence;

pub trait DatasetTrait {
    type Item;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按索引读取, 越界返回 `IndexOutOfRange`
    fn get(&self, index: usize) -> Result<Self::Item>;

    /// 读取时间戳列表, 第 i 行对应第 i 帧
    fn timestamps(&self) -> &TimestampTable;
}
