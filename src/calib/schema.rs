//! Documented shapes of the KITTI calibration keys.
//!
//! The parser always reshapes by arity. This table only decides when that
//! inference deserves a warning.

use super::CalibShape;

/// Shape documented for `key` in the KITTI devkit, `None` for keys we do not know.
pub(crate) fn documented_shape(key: &str) -> Option<CalibShape> {
    let name = key.strip_suffix(':').unwrap_or(key);
    match strip_camera_suffix(name) {
        "K" | "R" | "R_rect" => Some(CalibShape::Matrix3x3),
        "P_rect" | "P0" | "P1" | "P2" | "P3" | "Tr" => Some(CalibShape::Matrix3x4),
        "S" | "S_rect" | "delta_f" | "delta_c" => Some(CalibShape::Vector(2)),
        "T" => Some(CalibShape::Vector(3)),
        "D" => Some(CalibShape::Vector(5)),
        "corner_dist" => Some(CalibShape::Vector(1)),
        _ => None,
    }
}

/// `P_rect_02` -> `P_rect`, `K_00` -> `K`, `R` -> `R`
fn strip_camera_suffix(name: &str) -> &str {
    match name.rsplit_once('_') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}
