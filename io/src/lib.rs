//! Disparity map I/O.
//!
//! Two persisted forms: an exact float map (PFM, one 32-bit sample per
//! pixel, occlusions as NaN) and a lossy 8-bit visualization (gray ramp
//! over the disparity range, cyan for occlusions).

pub mod pfm;
pub mod visual;

pub use pfm::{read_pfm, write_disparity, write_pfm};
pub use visual::{scaled_image, write_scaled};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, IoError>;
