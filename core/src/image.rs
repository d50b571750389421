//! Rectified image views with Birchfield-Tomasi interval preprocessing.
//!
//! Each channel of a view carries, next to its raw intensities, a pair of
//! interval images `lo`/`hi`: the min and max over the half-sums
//! `(I(p) + I(q)) / 2` for `q` ranging over `p` and its in-image 4-neighbors.
//! The intervals are computed once when the view is built and make the
//! sampling-insensitive dissimilarity a pair of table lookups.

use crate::{Coord, Error, Result};
use image::{GrayImage, RgbImage};
use tracing::warn;

/// One channel of a view plus its precomputed intensity intervals.
#[derive(Debug, Clone)]
pub struct Plane {
    value: Vec<u8>,
    lo: Vec<u8>,
    hi: Vec<u8>,
}

/// One rectified view, gray (1 plane) or color (3 planes).
#[derive(Debug, Clone)]
pub struct View {
    size: Coord,
    planes: Vec<Plane>,
}

impl View {
    fn from_planes(size: Coord, raw: Vec<Vec<u8>>) -> View {
        let planes = raw
            .into_iter()
            .map(|value| {
                let (lo, hi) = neighbor_intervals(&value, size);
                Plane { value, lo, hi }
            })
            .collect();
        View { size, planes }
    }

    pub fn size(&self) -> Coord {
        self.size
    }

    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    pub fn is_color(&self) -> bool {
        self.planes.len() == 3
    }

    fn index(&self, p: Coord) -> usize {
        debug_assert!(p.in_rect(self.size));
        p.y as usize * self.size.x as usize + p.x as usize
    }

    /// Raw intensity of channel `c` at `p`.
    pub fn value(&self, c: usize, p: Coord) -> i32 {
        self.planes[c].value[self.index(p)] as i32
    }

    /// Lower end of the neighbor-averaged intensity interval.
    pub fn lo(&self, c: usize, p: Coord) -> i32 {
        self.planes[c].lo[self.index(p)] as i32
    }

    /// Upper end of the neighbor-averaged intensity interval.
    pub fn hi(&self, c: usize, p: Coord) -> i32 {
        self.planes[c].hi[self.index(p)] as i32
    }
}

/// Min/max over `p` and its 4-neighbors of the half-sum with `p`.
fn neighbor_intervals(value: &[u8], size: Coord) -> (Vec<u8>, Vec<u8>) {
    let (w, h) = (size.x as usize, size.y as usize);
    let mut lo = vec![0u8; w * h];
    let mut hi = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let at = |xx: usize, yy: usize| value[yy * w + xx] as i32;
            let i = at(x, y);
            let half = |n: i32| (n + i) / 2;
            let mut min = i;
            let mut max = i;
            let mut fold = |v: i32| {
                min = min.min(v);
                max = max.max(v);
            };
            if x > 0 {
                fold(half(at(x - 1, y)));
            }
            if x + 1 < w {
                fold(half(at(x + 1, y)));
            }
            if y > 0 {
                fold(half(at(x, y - 1)));
            }
            if y + 1 < h {
                fold(half(at(x, y + 1)));
            }
            lo[y * w + x] = min as u8;
            hi[y * w + x] = max as u8;
        }
    }
    (lo, hi)
}

/// A rectified stereo pair with interval images ready for matching.
#[derive(Debug, Clone)]
pub struct StereoPair {
    pub left: View,
    pub right: View,
}

impl StereoPair {
    /// Build a pair from two grayscale images.
    ///
    /// Widths must agree; differing heights are clamped to the common height.
    pub fn from_gray(left: &GrayImage, right: &GrayImage) -> Result<StereoPair> {
        let (sl, sr) = common_sizes(
            left.width(),
            left.height(),
            right.width(),
            right.height(),
        )?;
        Ok(StereoPair {
            left: View::from_planes(sl, vec![crop_plane(left.as_raw(), left.width(), sl)]),
            right: View::from_planes(sr, vec![crop_plane(right.as_raw(), right.width(), sr)]),
        })
    }

    /// Build a pair from two RGB images.
    ///
    /// If both images are gray in disguise (identical channels everywhere)
    /// they are reduced to a single-plane gray pair.
    pub fn from_images(left: &RgbImage, right: &RgbImage) -> Result<StereoPair> {
        if is_gray(left) && is_gray(right) {
            warn!("color input has identical channels, matching as gray");
            return Self::from_gray(&extract_red(left), &extract_red(right));
        }
        let (sl, sr) = common_sizes(
            left.width(),
            left.height(),
            right.width(),
            right.height(),
        )?;
        Ok(StereoPair {
            left: View::from_planes(sl, split_channels(left, sl)),
            right: View::from_planes(sr, split_channels(right, sr)),
        })
    }

    pub fn is_color(&self) -> bool {
        self.left.is_color()
    }
}

fn common_sizes(wl: u32, hl: u32, wr: u32, hr: u32) -> Result<(Coord, Coord)> {
    if wl != wr {
        return Err(Error::WidthMismatch { left: wl, right: wr });
    }
    let h = hl.min(hr);
    if hl != hr {
        warn!(left = hl, right = hr, common = h, "image heights differ, clamping");
    }
    Ok((Coord::new(wl as i32, h as i32), Coord::new(wr as i32, h as i32)))
}

fn crop_plane(raw: &[u8], width: u32, size: Coord) -> Vec<u8> {
    raw[..size.y as usize * width as usize].to_vec()
}

fn split_channels(im: &RgbImage, size: Coord) -> Vec<Vec<u8>> {
    let n = size.y as usize * size.x as usize;
    let mut planes: Vec<Vec<u8>> = (0..3).map(|_| Vec::with_capacity(n)).collect();
    for px in im.pixels().take(n) {
        for c in 0..3 {
            planes[c].push(px[c]);
        }
    }
    planes
}

fn is_gray(im: &RgbImage) -> bool {
    im.pixels().all(|p| p[0] == p[1] && p[0] == p[2])
}

fn extract_red(im: &RgbImage) -> GrayImage {
    GrayImage::from_fn(im.width(), im.height(), |x, y| {
        image::Luma([im.get_pixel(x, y)[0]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)]))
    }

    #[test]
    fn intervals_use_four_neighbors() {
        // Row [10, 20, 30]: the middle pixel averages against both sides.
        let im = gray(3, 1, |x, _| (10 + 10 * x) as u8);
        let pair = StereoPair::from_gray(&im, &im).unwrap();
        let p = Coord::new(1, 0);
        assert_eq!(pair.left.value(0, p), 20);
        assert_eq!(pair.left.lo(0, p), 15);
        assert_eq!(pair.left.hi(0, p), 25);
        // Corner pixel only has one horizontal neighbor.
        let c = Coord::new(0, 0);
        assert_eq!(pair.left.lo(0, c), 10);
        assert_eq!(pair.left.hi(0, c), 15);
    }

    #[test]
    fn width_mismatch_is_fatal() {
        let a = gray(4, 4, |_, _| 0);
        let b = gray(5, 4, |_, _| 0);
        assert!(StereoPair::from_gray(&a, &b).is_err());
    }

    #[test]
    fn heights_clamp_to_common() {
        let a = gray(4, 6, |_, _| 0);
        let b = gray(4, 4, |_, _| 0);
        let pair = StereoPair::from_gray(&a, &b).unwrap();
        assert_eq!(pair.left.size(), Coord::new(4, 4));
        assert_eq!(pair.right.size(), Coord::new(4, 4));
    }

    #[test]
    fn fake_color_reduces_to_gray() {
        let im = RgbImage::from_fn(3, 3, |x, _| image::Rgb([x as u8, x as u8, x as u8]));
        let pair = StereoPair::from_images(&im, &im).unwrap();
        assert!(!pair.is_color());
        assert_eq!(pair.left.channels(), 1);
    }
}
