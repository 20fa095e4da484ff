//! 相机模型
//!
//! KITTI stores one block of keys per camera, suffixed with the zero-padded camera number:
//! `K_02:` (intrinsic matrix), `D_02:` (distortion), `S_02:` (image size), ...

mod pinhole_camera;
pub use pinhole_camera::{PinholeCamera, PinholeParameters};

use crate::config::{INTRINSIC_KEY_PREFIX, MAX_SEQUENCE_ID};
use crate::error::{KittiError, Result};

/// `K_0<camera>:`
pub fn intrinsic_key(camera: u32) -> Result<String> {
    calib_key(INTRINSIC_KEY_PREFIX, camera)
}

/// Builds `<prefix><camera>:`, e.g. `("D_0", 2)` -> `D_02:`.
///
/// Only single digit cameras fit the `_0N` convention.
pub(crate) fn calib_key(prefix: &str, camera: u32) -> Result<String> {
    if camera > MAX_SEQUENCE_ID {
        return Err(KittiError::UnsupportedSequenceId { id: camera });
    }
    Ok(format!("{prefix}{camera}:"))
}
