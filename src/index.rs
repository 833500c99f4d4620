//! The mapping between grid cells and solver variable ids.

use crate::location::Location;
use crate::problem::Problem;

/// The bijection between `(cell, pair)` and 1-based solver variable ids.
///
/// `id(x, y, i) = x + n*y + n*m*i + 1`, giving a dense id space of size `n*m*p`
/// fixed for the lifetime of one [`Problem`]. The encoder and decoder must agree on
/// this pairing exactly; [`VarIndex::decompose`] is its inverse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VarIndex {
    n: usize,
    m: usize,
    pairs: usize,
}

impl VarIndex {
    /// Index for `pairs` boolean layers over an `n` by `m` grid.
    pub fn new(n: usize, m: usize, pairs: usize) -> Self {
        Self { n, m, pairs }
    }

    /// Index matching `problem`'s grid and pair count.
    pub fn of(problem: &Problem) -> Self {
        Self::new(problem.width(), problem.height(), problem.pairs().len())
    }

    /// Total number of variables, `n*m*p`.
    pub fn variables(&self) -> usize {
        self.n * self.m * self.pairs
    }

    /// The variable id of `location` under pair `pair`.
    pub fn id(&self, location: Location, pair: usize) -> usize {
        debug_assert!(location.0 < self.n && location.1 < self.m && pair < self.pairs);
        location.0 + self.n * location.1 + self.n * self.m * pair + 1
    }

    /// Recover `(cell, pair)` from a raw id in `1..=variables()`.
    pub fn decompose(&self, id: usize) -> (Location, usize) {
        debug_assert!((1..=self.variables()).contains(&id));
        let zero_based = id - 1;
        let pair = zero_based / (self.n * self.m);
        let rest = zero_based % (self.n * self.m);
        (Location(rest % self.n, rest / self.n), pair)
    }
}
