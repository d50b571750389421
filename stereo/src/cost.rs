//! Data and smoothness cost kernels.
//!
//! The data term is the Birchfield-Tomasi sampling-insensitive
//! dissimilarity, computed from intensity intervals over a pixel and its
//! 4-neighbors rather than the classical two horizontal half-samples.

use crate::{DataCost, Matcher};
use kz_core::Coord;

/// Upper bound on the intensity dissimilarity before optional squaring.
pub const CUTOFF: i32 = 30;

/// Distance from `v` to the interval `[lo, hi]`.
#[inline]
fn dist_interval(v: i32, lo: i32, hi: i32) -> i32 {
    if v < lo {
        lo - v
    } else if v > hi {
        v - hi
    } else {
        0
    }
}

impl Matcher {
    fn channel_penalty(&self, c: usize, p: Coord, q: Coord) -> i32 {
        let left = &self.pair.left;
        let right = &self.pair.right;
        let dp = dist_interval(left.value(c, p), right.lo(c, q), right.hi(c, q));
        let dq = dist_interval(right.value(c, q), left.lo(c, p), left.hi(c, p));
        let d = dp.min(dq).min(CUTOFF);
        match self.params.data_cost {
            DataCost::L1 => d,
            DataCost::L2 => d * d,
        }
    }

    /// Dissimilarity of left pixel `p` and right pixel `q`.
    pub fn data_penalty(&self, p: Coord, q: Coord) -> i32 {
        if self.pair.is_color() {
            (0..3).map(|c| self.channel_penalty(c, p, q)).sum::<i32>() / 3
        } else {
            self.channel_penalty(0, p, q)
        }
    }

    /// Penalty for breaking the assignments `(p1, p1+d)` and `(p2, p2+d)`
    /// apart: cheap across an intensity edge, expensive inside smooth areas.
    pub fn smoothness_penalty(&self, p1: Coord, p2: Coord, d: i32) -> i32 {
        let left = &self.pair.left;
        let right = &self.pair.right;
        let edge = if self.pair.is_color() {
            // Inf-norm over channels on both sides.
            let mut max = 0;
            for c in 0..3 {
                max = max.max((left.value(c, p1) - left.value(c, p2)).abs());
                max = max.max((right.value(c, p1 + d) - right.value(c, p2 + d)).abs());
            }
            max >= self.params.edge_thresh
        } else {
            let dl = (left.value(0, p1) - left.value(0, p2)).abs();
            let dr = (right.value(0, p1 + d) - right.value(0, p2 + d)).abs();
            dl >= self.params.edge_thresh || dr >= self.params.edge_thresh
        };
        if edge {
            self.params.lambda2
        } else {
            self.params.lambda1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parameters;
    use kz_core::StereoPair;
    use image::{GrayImage, Luma};

    fn matcher_from_rows(left: &[u8], right: &[u8], params: Parameters) -> Matcher {
        let w = left.len() as u32;
        let l = GrayImage::from_fn(w, 1, |x, _| Luma([left[x as usize]]));
        let r = GrayImage::from_fn(w, 1, |x, _| Luma([right[x as usize]]));
        let pair = StereoPair::from_gray(&l, &r).unwrap();
        let mut m = Matcher::new(pair, 0, 0).unwrap();
        m.set_parameters(params).unwrap();
        m
    }

    #[test]
    fn identical_pixels_cost_nothing() {
        let m = matcher_from_rows(&[10, 20, 30], &[10, 20, 30], Parameters::default());
        for x in 0..3 {
            let p = Coord::new(x, 0);
            assert_eq!(m.data_penalty(p, p), 0);
        }
    }

    #[test]
    fn interval_overlap_absorbs_small_shifts() {
        // 15 sits inside the widened interval of the 10/20 ramp.
        let m = matcher_from_rows(&[10, 20, 30], &[15, 25, 35], Parameters::default());
        assert_eq!(m.data_penalty(Coord::new(1, 0), Coord::new(1, 0)), 0);
    }

    #[test]
    fn large_differences_clamp_at_cutoff() {
        let mut params = Parameters::default();
        params.data_cost = DataCost::L1;
        let m = matcher_from_rows(&[0, 0, 0], &[200, 200, 200], params);
        assert_eq!(m.data_penalty(Coord::new(1, 0), Coord::new(1, 0)), CUTOFF);

        let mut params = Parameters::default();
        params.data_cost = DataCost::L2;
        let m = matcher_from_rows(&[0, 0, 0], &[200, 200, 200], params);
        assert_eq!(
            m.data_penalty(Coord::new(1, 0), Coord::new(1, 0)),
            CUTOFF * CUTOFF
        );
    }

    #[test]
    fn smoothness_switches_at_edges() {
        let mut params = Parameters::default();
        params.lambda1 = 9;
        params.lambda2 = 3;
        params.edge_thresh = 8;
        // Flat on the left of the pair, a strong step between x=1 and x=2.
        let m = matcher_from_rows(&[50, 50, 200], &[50, 50, 200], params);
        assert_eq!(
            m.smoothness_penalty(Coord::new(0, 0), Coord::new(1, 0), 0),
            9
        );
        assert_eq!(
            m.smoothness_penalty(Coord::new(1, 0), Coord::new(2, 0), 0),
            3
        );
    }
}
