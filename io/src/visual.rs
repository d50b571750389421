//! 8-bit visualization of a disparity map.

use crate::Result;
use image::{Rgb, RgbImage};
use kz_core::{Coord, DisparityMap, OCCLUDED};
use std::path::Path;

/// Occluded pixels render as cyan.
const OCCLUSION_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
/// Darkest gray of the disparity ramp.
const RAMP_FLOOR: i32 = 64;

/// Render the map as gray levels over the disparity range.
///
/// By default larger disparities (closer objects) are brighter; `reverse`
/// flips the ramp. A degenerate range saturates to white.
pub fn scaled_image(map: &DisparityMap, reverse: bool) -> RgbImage {
    let range = map.max_disparity - map.min_disparity + 1;
    RgbImage::from_fn(map.width, map.height, |x, y| {
        let d = map.get(Coord::new(x as i32, y as i32));
        if d == OCCLUDED {
            return OCCLUSION_COLOR;
        }
        let c = if range <= 0 {
            255
        } else if reverse {
            255 - (255 - RAMP_FLOOR) * (d - map.min_disparity) / range
        } else {
            255 - (255 - RAMP_FLOOR) * (map.max_disparity - d) / range
        };
        Rgb([c as u8; 3])
    })
}

/// Write the visualization to `path`; the format follows the extension.
pub fn write_scaled(path: &Path, map: &DisparityMap, reverse: bool) -> Result<()> {
    scaled_image(map, reverse).save(path)?;
    Ok(())
}
