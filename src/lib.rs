#![warn(missing_docs)]

//! # `gridroute`
//!
//! A router for multi-pair disjoint paths on rectangular grids: given an n×m grid and p pairs of terminal cells,
//! connect every pair with a simple 4-connected path such that no cell is used by two paths, minimizing the total number of occupied cells.
//! Begin by validating a [`Problem`], pick an [`Oracle`](oracle::Oracle) such as [`PbSolverCommand`](oracle::PbSolverCommand),
//! and hand both to a [`Router`](optimize::Router); [`optimize()`](optimize::Router::optimize) yields a minimum-cost [`Solution`].
//!
//! # Internals
//! This crate is driven by expressing the routing problem as pseudo-Boolean (0-1 integer linear) constraints,
//! handing them to an external black-box solver in OPB text form, and re-reading the returned model as per-cell path labels.
//! The solver is an external collaborator invoked as a child process; this crate only emits instances and interprets their models,
//! implementing no search, propagation, or learning of its own.
//!
//! One Boolean variable exists per (cell, pair): "this cell is on this pair's path."
//! We make the following assertions in pseudo-Boolean form:
//! 1. Each terminal cell is occupied by its own pair and has exactly one occupied neighbor under that pair, so a path leaves each terminal exactly once.
//! 2. Any other cell occupied by a pair has exactly two occupied neighbors under that pair, so paths continue without branching.
//! 3. No cell is occupied by more than one pair.
//!
//! Minimality does not come from the solver alone: the total occupied count is capped by one extra constraint and the cap is
//! binary searched between the provable lower bound (the sum of per-pair Manhattan distances, plus one cell each) and the
//! full grid size. Feasibility is monotone in the cap, so the tightest feasible cap is optimal.

pub use decode::Solution;
pub use location::{Dimension, Location};
pub use problem::{Pair, Problem};

pub(crate) mod decode;
mod tests;
pub mod encode;
pub mod error;
pub mod index;
pub(crate) mod location;
pub mod oracle;
pub mod optimize;
pub(crate) mod problem;
