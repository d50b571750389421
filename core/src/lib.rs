//! Shared types for graph-cut stereo matching.
//!
//! This crate holds the pieces every other crate in the workspace talks
//! about: integer pixel coordinates, dense disparity maps with an occlusion
//! sentinel, and rectified image views with their precomputed
//! Birchfield-Tomasi intensity intervals.

pub mod coord;
pub mod disparity;
pub mod image;

pub use coord::Coord;
pub use disparity::{DisparityMap, OCCLUDED};
pub use image::{StereoPair, View};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("incompatible image widths: left is {left} pixels wide, right is {right}")]
    WidthMismatch { left: u32, right: u32 },

    #[error("calibration failed: {0}")]
    Calibration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
