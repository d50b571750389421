//! Dense two-frame stereo matching by energy minimization with graph cuts.
//!
//! The matcher searches over assignments (pairs of a left pixel and the
//! right pixel it corresponds to, displaced horizontally by an integer
//! disparity) for the configuration of lowest energy, subject to each pixel
//! taking part in at most one active assignment. Pixels left without an
//! active assignment are occluded. Minimization runs as a series of
//! alpha-expansion moves, each solved exactly by a min-cut.

pub mod cost;
pub mod driver;
pub mod energy_check;
pub mod expansion;
pub mod params;
pub mod stats;

pub use driver::RunStats;
pub use params::{DataCost, Parameters, MAX_DENOM};

use expansion::VarState;
use kz_core::{Coord, DisparityMap, Error, Result, StereoPair};

/// Half of the 4-neighborhood; the other half is reached by walking these
/// offsets from the other endpoint, so each pixel edge is seen exactly once.
pub(crate) const NEIGHBORS: [Coord; 2] = [Coord::new(-1, 0), Coord::new(0, 1)];

/// Stereo matcher state for one image pair and disparity range.
pub struct Matcher {
    pair: StereoPair,
    disp_min: i32,
    disp_max: i32,
    params: Parameters,
    /// Disparity of each left pixel, or occluded.
    d_left: DisparityMap,
    /// Negated disparity of the left pixel matched to each right pixel.
    /// Gives O(1) access to the current partner of a right pixel.
    d_right: DisparityMap,
    /// Current total energy, kept in step with the labeling.
    energy: i64,
    /// Per-move scratch, one slot per left pixel; contents are meaningless
    /// outside the move that wrote them.
    vars0: Vec<VarState>,
    vars_alpha: Vec<VarState>,
}

impl Matcher {
    pub fn new(pair: StereoPair, disp_min: i32, disp_max: i32) -> Result<Matcher> {
        if disp_min > disp_max {
            return Err(Error::InvalidParameter(format!(
                "empty disparity range [{disp_min}, {disp_max}]"
            )));
        }
        let l = pair.left.size();
        let r = pair.right.size();
        let pixels = (l.x * l.y) as usize;
        Ok(Matcher {
            d_left: DisparityMap::filled_occluded(l.x as u32, l.y as u32, disp_min, disp_max),
            d_right: DisparityMap::filled_occluded(r.x as u32, r.y as u32, -disp_max, -disp_min),
            vars0: vec![VarState::Absent; pixels],
            vars_alpha: vec![VarState::Absent; pixels],
            energy: 0,
            params: Parameters::default(),
            pair,
            disp_min,
            disp_max,
        })
    }

    pub fn set_parameters(&mut self, params: Parameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn disparity_range(&self) -> (i32, i32) {
        (self.disp_min, self.disp_max)
    }

    /// Left-view disparity map.
    pub fn disparity(&self) -> &DisparityMap {
        &self.d_left
    }

    /// Right-view partner map.
    pub fn disparity_right(&self) -> &DisparityMap {
        &self.d_right
    }

    /// Energy of the current labeling.
    pub fn energy(&self) -> i64 {
        self.energy
    }

    pub(crate) fn left_size(&self) -> Coord {
        self.pair.left.size()
    }

    pub(crate) fn right_size(&self) -> Coord {
        self.pair.right.size()
    }

    pub(crate) fn idx(&self, p: Coord) -> usize {
        p.y as usize * self.left_size().x as usize + p.x as usize
    }
}
