//! KITTI raw data loader
//!
//! Parses `calib_cam_to_cam.txt` style calibration files, indexes a camera's image directory,
//! pairs it with its `timestamps.txt` and decodes frames on demand.
//!
//! ```no_run
//! use kitti_loader::KittiSequence;
//!
//! let seq = KittiSequence::new(
//!     "datasets/2011_09_26/2011_09_26_drive_0018_extract/image_02",
//!     "datasets/2011_09_26/calib_cam_to_cam.txt",
//!     "datasets/2011_09_26/2011_09_26_drive_0018_extract/image_02/timestamps.txt",
//!     false,
//! )?;
//! let k = seq.intrinsics()?;
//! println!("{} frames, fx = {}", seq.len(), k.fx);
//! let img = seq.get(0)?;
//! println!("{:?}", img.shape());
//! # Ok::<(), kitti_loader::KittiError>(())
//! ```

pub mod calib;
pub mod camera;
pub mod config;
pub mod dataset;
pub mod decoder;
mod error;

pub use calib::{CalibShape, CalibValue, CalibrationRecord};
pub use camera::{PinholeCamera, PinholeParameters};
pub use config::{DatasetConfig, SequenceOptions};
pub use dataset::{DatasetTrait, Frame, KittiSequence, Timestamp, TimestampTable};
pub use decoder::{ColorMode, ImageDecoder, ImageSize, PixelArray};
pub use error::{KittiError, Result};
