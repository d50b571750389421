//! Automatic calibration of the occlusion reward `k`.

use crate::Matcher;
use kz_core::{Coord, Error, Result};
use rayon::prelude::*;
use tracing::info;

impl Matcher {
    /// Estimate `k` from image statistics.
    ///
    /// For every pixel whose whole disparity range stays inside the right
    /// image, take the k-th smallest data penalty across the range (with
    /// `k` about a quarter of the number of labels, at least 3); the
    /// average of these order statistics is the estimate. Roughly: a
    /// correct match should beat three quarters of the candidates, and
    /// anything worse than this noise level is better explained as an
    /// occlusion.
    pub fn auto_k(&self) -> Result<f32> {
        let labels = (self.disp_max - self.disp_min + 1) as usize;
        let kth = ((labels + 2) / 4).max(3).min(labels);

        let size = self.left_size();
        let xmin = 0.max(-self.disp_min);
        let xmax = size.x.min(self.right_size().x - 0.max(self.disp_max));

        let (sum, num) = (0..size.y)
            .into_par_iter()
            .map(|y| {
                let mut row_sum = 0i64;
                let mut row_num = 0i64;
                let mut penalties = Vec::with_capacity(labels);
                for x in xmin..xmax {
                    let p = Coord::new(x, y);
                    penalties.clear();
                    for d in self.disp_min..=self.disp_max {
                        penalties.push(self.data_penalty(p, p + d));
                    }
                    let (_, kth_smallest, _) = penalties.select_nth_unstable(kth - 1);
                    row_sum += i64::from(*kth_smallest);
                    row_num += 1;
                }
                (row_sum, row_num)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        if num == 0 {
            return Err(Error::Calibration(
                "no pixel sees the full disparity range".into(),
            ));
        }
        if sum == 0 {
            return Err(Error::Calibration("data penalty statistic is zero".into()));
        }
        let k = (sum as f64 / num as f64) as f32;
        info!(k, samples = num, "estimated occlusion reward from data noise");
        Ok(k)
    }
}
