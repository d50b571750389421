//! Minimization of pseudo-boolean energies by reduction to min-cut.
//!
//! An energy is a constant plus one-variable terms `E(x)` plus two-variable
//! terms `E(x, y)`. Every two-variable term must be submodular,
//! `E(0,0) + E(1,1) <= E(0,1) + E(1,0)`; exactly those terms are
//! representable by a non-negative edge after shifting costs onto the
//! terminal links.

use crate::graph::{Capacity, Flow, Graph, NodeId, Term};

/// Handle of a binary variable.
pub type Var = NodeId;

/// Value of a single term.
pub type Value = Capacity;

/// Value of the total energy.
pub type TotalValue = Flow;

/// Edge weight no minimum cut can afford; used to forbid configurations.
const INFINITE: Value = Value::MAX;

pub struct Energy {
    graph: Graph,
    constant: TotalValue,
}

impl Energy {
    pub fn new() -> Energy {
        Energy::with_capacity(0, 0)
    }

    /// Pre-size for `var_hint` variables and `arc_hint` arcs.
    pub fn with_capacity(var_hint: usize, arc_hint: usize) -> Energy {
        Energy {
            graph: Graph::with_capacity(var_hint, arc_hint),
            constant: 0,
        }
    }

    pub fn var_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn add_constant(&mut self, e: Value) {
        self.constant += TotalValue::from(e);
    }

    /// New binary variable with the term `E(0) = e0, E(1) = e1`.
    pub fn add_variable(&mut self, e0: Value, e1: Value) -> Var {
        let x = self.graph.add_node();
        self.add_term1(x, e0, e1);
        x
    }

    /// Term of one variable; `e0` and `e1` may be arbitrary.
    pub fn add_term1(&mut self, x: Var, e0: Value, e1: Value) {
        self.graph.add_tweights(x, e1, e0);
    }

    /// Term of two variables with `E(0,0) = e00, E(0,1) = e01,
    /// E(1,0) = e10, E(1,1) = e11`. Must be submodular.
    pub fn add_term2(&mut self, x: Var, y: Var, e00: Value, e01: Value, e10: Value, e11: Value) {
        assert!(
            e00 + e11 <= e01 + e10,
            "non-submodular term ({e00}, {e01}, {e10}, {e11})"
        );
        self.graph.add_tweights(x, e11, e01);
        self.graph.add_tweights(y, 0, e00 - e01);
        self.graph.add_edge(x, y, 0, e01 + e10 - e00 - e11);
    }

    /// Make the configuration `x = 0, y = 1` impossible.
    pub fn forbid01(&mut self, x: Var, y: Var) {
        self.graph.add_edge(x, y, INFINITE, 0);
    }

    /// Minimize the energy; afterwards [`var_value`](Self::var_value) reads
    /// off a minimizing assignment.
    pub fn minimize(&mut self) -> TotalValue {
        self.constant + self.graph.maxflow()
    }

    /// Value of `x` in the minimizing assignment.
    ///
    /// Variables the min-cut leaves undetermined read as 0; callers encode
    /// "leave things as they are" on that side, so a tie never flips state.
    pub fn var_value(&self, x: Var) -> bool {
        self.graph.what_segment(x, Term::Source) == Term::Sink
    }
}

impl Default for Energy {
    fn default() -> Self {
        Energy::new()
    }
}
