//! Matching parameters and their integer fixing.
//!
//! All costs are integers over a common `denominator`, so the graph works
//! in exact arithmetic. User-facing values are floats; [`set_fractions`]
//! picks the denominator in `1..=MAX_DENOM` minimizing the total relative
//! rounding error, which also keeps every per-edge term comfortably inside
//! 32 bits.

use crate::Matcher;
use kz_core::{Error, Result};
use tracing::{info, warn};

/// Largest denominator tried when approximating float costs as fractions.
pub const MAX_DENOM: i32 = 16;

/// Norm applied to the clamped Birchfield-Tomasi dissimilarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCost {
    L1,
    L2,
}

#[derive(Debug, Clone, Copy)]
pub struct Parameters {
    pub data_cost: DataCost,
    /// Common denominator of `k`, `lambda1` and `lambda2`.
    pub denominator: i32,
    /// Intensity step treated as an edge by the smoothness term.
    pub edge_thresh: i32,
    /// Smoothness cost inside smooth areas.
    pub lambda1: i32,
    /// Smoothness cost across intensity edges; expected `<= lambda1`.
    pub lambda2: i32,
    /// Reward per active assignment; lower values leave more pixels occluded.
    pub k: i32,
    /// Maximum number of outer sweeps over the labels.
    pub max_iter: u32,
    /// Reshuffle the label order before every sweep instead of once.
    pub randomize_every_iteration: bool,
    /// Seed for the label permutation; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            data_cost: DataCost::L2,
            denominator: 1,
            edge_thresh: 8,
            lambda1: 0,
            lambda2: 0,
            k: 0,
            max_iter: 4,
            randomize_every_iteration: false,
            seed: None,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        if self.k < 0 || self.lambda1 < 0 || self.lambda2 < 0 {
            return Err(Error::InvalidParameter(format!(
                "negative cost (k = {}, lambda1 = {}, lambda2 = {})",
                self.k, self.lambda1, self.lambda2
            )));
        }
        if self.edge_thresh < 0 {
            return Err(Error::InvalidParameter(format!(
                "negative edge threshold {}",
                self.edge_thresh
            )));
        }
        if self.denominator < 1 {
            return Err(Error::InvalidParameter(format!(
                "denominator {} must be at least 1",
                self.denominator
            )));
        }
        if self.max_iter < 1 {
            return Err(Error::InvalidParameter("max_iter must be at least 1".into()));
        }
        if self.lambda2 > self.lambda1 {
            warn!(
                lambda1 = self.lambda1,
                lambda2 = self.lambda2,
                "edge smoothness exceeds non-edge smoothness"
            );
        }
        Ok(())
    }
}

/// Store `k`, `lambda1`, `lambda2` as integer numerators over one common
/// denominator, chosen to minimize the summed relative rounding error.
pub(crate) fn set_fractions(params: &mut Parameters, k: f32, lambda1: f32, lambda2: f32) {
    let mut min_error = f32::MAX;
    for denom in 1..=MAX_DENOM {
        let f = denom as f32;
        let mut error = 0.0f32;
        let mut round = |v: f32| -> i32 {
            if v > 0.0 {
                let num = (f * v + 0.5) as i32;
                error += (num as f32 / (f * v) - 1.0).abs();
                num
            } else {
                0
            }
        };
        let (nk, n1, n2) = (round(k), round(lambda1), round(lambda2));
        if error < min_error {
            min_error = error;
            params.denominator = denom;
            params.k = nk;
            params.lambda1 = n1;
            params.lambda2 = n2;
        }
    }
}

impl Matcher {
    /// Resolve defaulted (negative) cost values and fix them as fractions.
    ///
    /// A negative `k` is computed from image statistics, a negative `lambda`
    /// defaults to `k / 5`, and negative `lambda1` / `lambda2` default to
    /// `3 * lambda` and `lambda` respectively.
    pub fn fix_parameters(&mut self, k: f32, lambda: f32, lambda1: f32, lambda2: f32) -> Result<()> {
        let k = if k < 0.0 { self.auto_k()? } else { k };
        let lambda = if lambda < 0.0 { k / 5.0 } else { lambda };
        let lambda1 = if lambda1 < 0.0 { 3.0 * lambda } else { lambda1 };
        let lambda2 = if lambda2 < 0.0 { lambda } else { lambda2 };

        set_fractions(&mut self.params, k, lambda1, lambda2);
        info!(
            k = self.params.k,
            lambda1 = self.params.lambda1,
            lambda2 = self.params.lambda2,
            denominator = self.params.denominator,
            "fixed cost parameters"
        );
        self.params.validate()
    }
}
