//! Portable float map (PFM) reader and writer.
//!
//! Grayscale `Pf` maps only: a three-line header, then rows of 32-bit
//! floats stored bottom-up, little-endian (the negative scale in the
//! header declares the byte order).

use crate::{IoError, Result};
use kz_core::DisparityMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Write `data` (row-major, top-down) as a grayscale PFM.
pub fn write_pfm<W: Write>(mut w: W, data: &[f32], width: u32, height: u32) -> Result<()> {
    assert_eq!(data.len(), (width * height) as usize);
    write!(w, "Pf\n{width} {height}\n-1.0\n")?;
    for row in (0..height as usize).rev() {
        for &v in &data[row * width as usize..(row + 1) * width as usize] {
            w.write_all(&v.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Read a grayscale PFM back into row-major top-down samples.
pub fn read_pfm<R: BufRead>(mut r: R) -> Result<(Vec<f32>, u32, u32)> {
    let mut line = String::new();
    r.read_line(&mut line)?;
    if line.trim() != "Pf" {
        return Err(IoError::Parse(format!("not a grayscale PFM: {:?}", line.trim())));
    }

    line.clear();
    r.read_line(&mut line)?;
    let mut dims = line.split_whitespace();
    let width: u32 = parse_field(dims.next(), "width")?;
    let height: u32 = parse_field(dims.next(), "height")?;

    line.clear();
    r.read_line(&mut line)?;
    let scale: f32 = parse_field(Some(line.trim()), "scale")?;
    let little_endian = scale < 0.0;

    let count = (width * height) as usize;
    let mut raw = vec![0u8; count * 4];
    r.read_exact(&mut raw)?;

    let mut data = vec![0f32; count];
    for row in 0..height as usize {
        // Stored bottom-up.
        let src = height as usize - 1 - row;
        for col in 0..width as usize {
            let bytes: [u8; 4] = raw[(src * width as usize + col) * 4..][..4]
                .try_into()
                .expect("slice of length 4");
            data[row * width as usize + col] = if little_endian {
                f32::from_le_bytes(bytes)
            } else {
                f32::from_be_bytes(bytes)
            };
        }
    }
    Ok((data, width, height))
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, name: &str) -> Result<T> {
    field
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| IoError::Parse(format!("bad PFM header field: {name}")))
}

/// Save a disparity map as a float PFM, occlusions as NaN.
pub fn write_disparity(path: &Path, map: &DisparityMap) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_pfm(file, &map.to_f32(), map.width, map.height)
}

/// Load a float PFM written by [`write_disparity`].
pub fn read_disparity_samples(path: &Path) -> Result<(Vec<f32>, u32, u32)> {
    read_pfm(BufReader::new(File::open(path)?))
}
