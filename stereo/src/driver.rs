//! Outer alpha-expansion loop.

use crate::Matcher;
use kz_core::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Outcome of a [`Matcher::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Completed sweeps over the label set.
    pub sweeps: u32,
    pub attempted_moves: u64,
    pub accepted_moves: u64,
    /// Final energy of the labeling.
    pub energy: i64,
}

/// In-place Fisher-Yates shuffle of `0..n`.
fn generate_permutation(perm: &mut [usize], rng: &mut StdRng) {
    for (i, slot) in perm.iter_mut().enumerate() {
        *slot = i;
    }
    let n = perm.len();
    for i in 0..n.saturating_sub(1) {
        let j = rng.gen_range(i..n);
        perm.swap(i, j);
    }
}

impl Matcher {
    /// Minimize the energy by repeated expansion moves.
    ///
    /// Sweeps the disparity labels in (optionally re-)randomized order,
    /// expanding each; every accepted move re-arms all labels. The loop
    /// ends after a full sweep without improvement or after `max_iter`
    /// sweeps.
    pub fn run(&mut self) -> Result<RunStats> {
        self.params.validate()?;

        let labels = (self.disp_max - self.disp_min + 1) as usize;
        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.energy = self.compute_energy();
        info!(
            energy = self.energy,
            labels,
            seed = ?self.params.seed,
            "starting expansion"
        );

        let mut perm = vec![0usize; labels];
        // done[l] set once expanding label l can no longer improve things.
        let mut done = vec![false; labels];
        let mut remaining = labels;

        let mut stats = RunStats {
            sweeps: 0,
            attempted_moves: 0,
            accepted_moves: 0,
            energy: self.energy,
        };

        while stats.sweeps < self.params.max_iter && remaining > 0 {
            if stats.sweeps == 0 || self.params.randomize_every_iteration {
                generate_permutation(&mut perm, &mut rng);
            }

            for &label in perm.iter() {
                if done[label] {
                    continue;
                }
                let alpha = self.disp_min + label as i32;

                stats.attempted_moves += 1;
                if self.expansion_move(alpha) {
                    stats.accepted_moves += 1;
                    done.fill(false);
                    done[label] = true;
                    remaining = labels - 1;
                } else {
                    done[label] = true;
                    remaining -= 1;
                }
                debug_assert_eq!(self.energy, self.compute_energy());
                debug!(alpha, energy = self.energy, "label swept");
            }

            stats.sweeps += 1;
            info!(sweep = stats.sweeps, energy = self.energy, "sweep complete");
        }

        stats.energy = self.energy;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut perm = vec![0usize; 23];
        generate_permutation(&mut perm, &mut rng);
        let mut seen = vec![false; perm.len()];
        for &v in &perm {
            assert!(!seen[v]);
            seen[v] = true;
        }
    }

    #[test]
    fn permutation_is_seed_deterministic() {
        let mut a = vec![0usize; 16];
        let mut b = vec![0usize; 16];
        generate_permutation(&mut a, &mut StdRng::seed_from_u64(42));
        generate_permutation(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
