//! The cost optimizer: repeated encode-solve-decode cycles under a shrinking cap.

use tracing::{debug, info};

use crate::decode::{parse_response, Solution, Verdict};
use crate::encode::ConstraintSystem;
use crate::error::SolveError;
use crate::index::VarIndex;
use crate::oracle::Oracle;
use crate::problem::Problem;

/// The terminal result of a routing run.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Disjoint paths exist; `cost` is the solution's total occupied cell count.
    Routed {
        /// The decoded label grid.
        solution: Solution,
        /// Total occupied cells.
        cost: usize,
    },
    /// No disjoint routing exists at any cost. A legitimate problem outcome, not an
    /// error.
    Infeasible,
}

/// Drives encode-query-decode cycles against one [`Oracle`] for one [`Problem`].
///
/// Every query builds a fresh [`ConstraintSystem`]; nothing is mutated between
/// retries. All querying is synchronous and blocking, one solver call at a time.
pub struct Router<'a, O: Oracle> {
    problem: &'a Problem,
    oracle: O,
}

impl<'a, O: Oracle> Router<'a, O> {
    /// A router for `problem` backed by `oracle`.
    pub fn new(problem: &'a Problem, oracle: O) -> Self {
        Self { problem, oracle }
    }

    /// One full cycle at the given cost cap; `None` means infeasible at this cap.
    fn query(&mut self, c_max: usize) -> Result<Option<Solution>, SolveError> {
        let system = ConstraintSystem::encode(self.problem, c_max);
        let raw = self.oracle.invoke(&system)?;

        match parse_response(&raw, &VarIndex::of(self.problem))? {
            Verdict::Satisfiable(ids) => Ok(Some(Solution::from_model(self.problem, &ids))),
            Verdict::Unsatisfiable => Ok(None),
        }
    }

    /// Find any feasible routing with a single uncapped query.
    ///
    /// The returned solution is feasible but not necessarily optimal, and may carry
    /// stray loops; see [`Solution::walked`].
    pub fn solve(&mut self) -> Result<Outcome, SolveError> {
        match self.query(self.problem.cells())? {
            Some(solution) => Ok(Outcome::Routed { cost: solution.cost(), solution }),
            None => Ok(Outcome::Infeasible),
        }
    }

    /// Find a minimum-cost routing by binary search on the cost cap.
    ///
    /// Feasibility is monotone in the cap, since raising it only relaxes the one
    /// cap constraint. The search keeps `left` a proven-infeasible cap and `right`
    /// a proven-feasible cap with its model retained; when they meet, the retained
    /// model is optimal.
    pub fn optimize(&mut self) -> Result<Outcome, SolveError> {
        let upper = self.problem.cells();
        info!(cost = upper, "feasibility check");
        let Some(mut best) = self.query(upper)? else {
            info!("no routing exists");
            return Ok(Outcome::Infeasible);
        };

        let lower = self.problem.lower_bound();
        info!(cost = lower, "lower bound check");
        if let Some(solution) = self.query(lower)? {
            // every pair already at its Manhattan minimum; nothing shorter exists
            return Ok(Outcome::Routed { cost: solution.cost(), solution });
        }

        let mut left = lower;
        let mut right = upper;
        while left + 1 < right {
            let mut c_max = (left + right) / 2;
            if c_max == left {
                c_max += 1;
            }

            debug!(left, right, cost = c_max, "probing");
            match self.query(c_max)? {
                Some(solution) => {
                    info!(cost = c_max, "feasible");
                    right = c_max;
                    best = solution;
                }
                None => {
                    info!(cost = c_max, "infeasible");
                    left = c_max;
                }
            }
        }

        Ok(Outcome::Routed { cost: best.cost(), solution: best })
    }
}
