//! One alpha-expansion move, solved exactly by min-cut.
//!
//! Two binary variables can exist per left pixel `p`: one deciding whether
//! the current assignment of `p` stays active, one deciding whether the
//! assignment `(p, p+alpha)` becomes active. For the first kind SOURCE
//! means "kept" and SINK means "dropped"; for the second kind SOURCE means
//! "stays inactive" and SINK means "activated". Variables the cut leaves
//! undetermined read as their 0 side, so every such pixel keeps its current
//! state and an ambiguous move degenerates to the identity.

use crate::{Matcher, NEIGHBORS};
use kz_core::{Coord, OCCLUDED};
use kz_maxflow::{Energy, Var};
use tracing::debug;

/// Scratch slot of one pixel during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarState {
    /// The pixel already carries the expansion label; its assignment is
    /// forced active and contributes a constant.
    Active,
    /// No assignment exists on this side of the move.
    Absent,
    /// Undecided; resolved by the cut.
    Var(Var),
}

impl Matcher {
    /// Combined data and occlusion cost of one active assignment.
    pub(crate) fn data_occlusion_penalty(&self, p: Coord, q: Coord) -> i32 {
        self.params.denominator * self.data_penalty(p, q) - self.params.k
    }

    /// Create the variables encoding pixel `p` in the move to `alpha`.
    fn build_nodes(&mut self, e: &mut Energy, p: Coord, alpha: i32) {
        let d = self.d_left.get(p);
        let i = self.idx(p);

        if d == alpha {
            self.vars0[i] = VarState::Active;
            self.vars_alpha[i] = VarState::Active;
            e.add_constant(self.data_occlusion_penalty(p, p + d));
            return;
        }

        self.vars0[i] = if d != OCCLUDED {
            // Keeping the current assignment pays its cost on the 0 side.
            VarState::Var(e.add_variable(self.data_occlusion_penalty(p, p + d), 0))
        } else {
            VarState::Absent
        };

        let pa = p + alpha;
        self.vars_alpha[i] = if pa.in_rect(self.right_size()) {
            // Activating the alpha-assignment pays its cost on the 1 side.
            VarState::Var(e.add_variable(0, self.data_occlusion_penalty(p, pa)))
        } else {
            VarState::Absent
        };
    }

    /// Smoothness terms between `p` and its neighbor `np`, one per relevant
    /// disparity: `alpha` and the current labels of the two pixels.
    fn build_smoothness(&self, e: &mut Energy, p: Coord, np: Coord, alpha: i32) {
        let d = self.d_left.get(p);
        let var0 = self.vars0[self.idx(p)];
        let var_a = self.vars_alpha[self.idx(p)];

        let nd = self.d_left.get(np);
        let nvar0 = self.vars0[self.idx(np)];
        let nvar_a = self.vars_alpha[self.idx(np)];

        // Disparity alpha on both pixels.
        if var_a != VarState::Absent && nvar_a != VarState::Absent {
            let delta = self.smoothness_penalty(p, np, alpha);
            match (var_a, nvar_a) {
                // Penalize the two assignments having different activity.
                (VarState::Var(x), VarState::Var(y)) => e.add_term2(x, y, 0, delta, delta, 0),
                // One side is forced active: penalize the other staying out.
                (VarState::Var(x), VarState::Active) => e.add_term1(x, delta, 0),
                (VarState::Active, VarState::Var(y)) => e.add_term1(y, delta, 0),
                _ => {}
            }
        }

        // The current disparity of p, carried over to np.
        if let VarState::Var(x) = var0 {
            if (np + d).in_rect(self.right_size()) {
                let delta = self.smoothness_penalty(p, np, d);
                if d == nd {
                    if let VarState::Var(y) = nvar0 {
                        e.add_term2(x, y, 0, delta, delta, 0);
                    }
                } else {
                    // np does not carry d at all: keeping (p, p+d) active
                    // breaks the pair whatever happens to np.
                    e.add_term1(x, delta, 0);
                }
            }
        }

        // The current disparity of np, when p does not share it.
        if let VarState::Var(y) = nvar0 {
            if d != nd && (p + nd).in_rect(self.right_size()) {
                let delta = self.smoothness_penalty(p, np, nd);
                e.add_term1(y, delta, 0);
            }
        }
    }

    /// Uniqueness constraints involving pixel `p`.
    ///
    /// The widths agree and the views share their height, so `p` also
    /// ranges over the right view here.
    fn build_uniqueness(&self, e: &mut Energy, p: Coord, alpha: i32) {
        // A pixel cannot keep its old assignment and take the new one.
        if let VarState::Var(x) = self.vars0[self.idx(p)] {
            if let VarState::Var(y) = self.vars_alpha[self.idx(p)] {
                e.forbid01(x, y);
            }
        }

        // Two assignments cannot share the right pixel p: the one currently
        // ending there and the alpha-assignment that would land there.
        let d = self.d_right.get(p);
        if d == OCCLUDED {
            return;
        }
        let var0 = self.vars0[self.idx(p + d)];
        if var0 == VarState::Active {
            return;
        }
        let pa = p - alpha;
        if !pa.in_rect(self.left_size()) {
            return;
        }
        let var_a = self.vars_alpha[self.idx(pa)];
        if let (VarState::Var(x), VarState::Var(y)) = (var0, var_a) {
            e.forbid01(x, y);
        }
    }

    /// Commit the accepted move to the disparity maps.
    fn update_disparity(&mut self, e: &Energy, alpha: i32) {
        let size = self.left_size();

        // First drop the assignments the cut deactivated, then activate the
        // new ones; a right pixel may switch partners within one move.
        for y in 0..size.y {
            for x in 0..size.x {
                let p = Coord::new(x, y);
                if let VarState::Var(v) = self.vars0[self.idx(p)] {
                    if e.var_value(v) {
                        let d = self.d_left.get(p);
                        self.d_right.set(p + d, OCCLUDED);
                        self.d_left.set(p, OCCLUDED);
                    }
                }
            }
        }
        for y in 0..size.y {
            for x in 0..size.x {
                let p = Coord::new(x, y);
                if let VarState::Var(v) = self.vars_alpha[self.idx(p)] {
                    if e.var_value(v) {
                        self.d_left.set(p, alpha);
                        self.d_right.set(p + alpha, -alpha);
                    }
                }
            }
        }
    }

    /// Find the lowest-energy expansion of label `alpha` and accept it if
    /// it improves on the current labeling. Returns whether it did.
    pub(crate) fn expansion_move(&mut self, alpha: i32) -> bool {
        let size = self.left_size();
        let pixels = (size.x * size.y) as usize;
        let mut e = Energy::with_capacity(2 * pixels, 12 * pixels);

        for y in 0..size.y {
            for x in 0..size.x {
                self.build_nodes(&mut e, Coord::new(x, y), alpha);
            }
        }
        for y in 0..size.y {
            for x in 0..size.x {
                let p = Coord::new(x, y);
                for step in NEIGHBORS {
                    let np = p + step;
                    if np.in_rect(size) {
                        self.build_smoothness(&mut e, p, np, alpha);
                    }
                }
                self.build_uniqueness(&mut e, p, alpha);
            }
        }

        let energy = e.minimize();
        debug!(alpha, energy, current = self.energy, "expansion move solved");

        if energy < self.energy {
            self.update_disparity(&e, alpha);
            self.energy = energy;
            return true;
        }
        false
    }
}
