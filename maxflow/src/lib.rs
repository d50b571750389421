//! Max-flow / min-cut on arena-backed graphs, plus a binary-variable energy
//! minimizer built on top of it.
//!
//! The solver is the Boykov-Kolmogorov augmenting-paths algorithm with two
//! search trees and orphan adoption. The [`Energy`] wrapper reduces
//! submodular one- and two-variable terms to terminal weights and edges, so
//! a caller can state a pseudo-boolean objective and read the minimizing
//! assignment off the min-cut.

pub mod energy;
pub mod graph;

pub use energy::{Energy, TotalValue, Value, Var};
pub use graph::{Capacity, Flow, Graph, NodeId, Term};
