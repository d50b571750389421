//! Reference energy computation, independent of any move graph.
//!
//! Recomputes the full objective straight from the labeling. The driver
//! asserts in debug builds that it agrees with the value the min-cut
//! reported after every accepted move.

use crate::{Matcher, NEIGHBORS};
use kz_core::{Coord, OCCLUDED};

impl Matcher {
    /// Total energy of the current labeling.
    pub fn compute_energy(&self) -> i64 {
        let size = self.left_size();
        let right = self.right_size();
        let mut total = 0i64;

        for y in 0..size.y {
            for x in 0..size.x {
                let p = Coord::new(x, y);
                let d = self.d_left.get(p);
                if d != OCCLUDED {
                    total += i64::from(self.data_occlusion_penalty(p, p + d));
                }

                for step in NEIGHBORS {
                    let np = p + step;
                    if !np.in_rect(size) {
                        continue;
                    }
                    let nd = self.d_left.get(np);
                    if d == nd {
                        continue;
                    }
                    // Each side pays for carrying a disparity its neighbor
                    // does not share.
                    if d != OCCLUDED && (np + d).in_rect(right) {
                        total += i64::from(self.smoothness_penalty(p, np, d));
                    }
                    if nd != OCCLUDED && (p + nd).in_rect(right) {
                        total += i64::from(self.smoothness_penalty(p, np, nd));
                    }
                }
            }
        }
        total
    }
}
