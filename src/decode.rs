use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use ndarray::Array2;
use strum::VariantArray;

use crate::error::DecodeError;
use crate::index::VarIndex;
use crate::location::{Location, Step};
use crate::problem::{Pair, Problem};

/// What the solver said about one instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// A model was found; these are the ids of the variables assigned true.
    Satisfiable(Vec<usize>),
    Unsatisfiable,
}

/// Parse raw solver output: the `s ` status line decides satisfiability, and for a
/// satisfiable instance the `v ` line lists the model, `x<id>` tokens for true
/// variables and `~x<id>` (or absence) for false ones.
pub(crate) fn parse_response(text: &str, index: &VarIndex) -> Result<Verdict, DecodeError> {
    let status = text.lines()
        .find(|line| line.starts_with("s "))
        .ok_or(DecodeError::MissingStatus)?;

    if status.contains("UNSAT") {
        return Ok(Verdict::Unsatisfiable);
    }

    let model = text.lines()
        .find(|line| line.starts_with("v "))
        .ok_or(DecodeError::MissingModel)?;

    let mut true_ids = Vec::new();
    for token in model.split_whitespace().skip(1) {
        if token.starts_with('~') || token.starts_with('-') {
            // a false variable; absence from the grid already encodes it
            continue;
        }

        let id: usize = token.strip_prefix('x')
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| DecodeError::BadLiteral { token: token.to_owned() })?;

        if id == 0 || id > index.variables() {
            return Err(DecodeError::IdOutOfRange { id, max: index.variables() });
        }

        true_ids.push(id);
    }

    Ok(Verdict::Satisfiable(true_ids))
}

/// A decoded routing: per-cell pair labels, `0` for an unused cell and `i + 1` for
/// a cell on pair `i`'s path.
///
/// Derived from one solver model by collapsing the per-pair variable dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    grid: Array2<usize>,
    pairs: Vec<Pair>,
}

impl Solution {
    /// Collapse a model, given as the ids of its true variables, onto the grid.
    ///
    /// A cell active under two pairs would be a defect in the constraint encoding,
    /// not a runtime condition, so it is only debug-asserted.
    pub(crate) fn from_model(problem: &Problem, true_ids: &[usize]) -> Self {
        let index = VarIndex::of(problem);
        let mut grid = Array2::zeros((problem.height(), problem.width()));

        for &id in true_ids {
            let (location, pair) = index.decompose(id);
            let slot = grid.get_mut(location.as_index()).unwrap();
            debug_assert!(
                *slot == 0 || *slot == pair + 1,
                "cell {} labeled by pairs {} and {}", location, *slot, pair + 1,
            );
            *slot = pair + 1;
        }

        Self { grid, pairs: problem.pairs().to_vec() }
    }

    /// The label grid, indexed `[(y, x)]`.
    pub fn labels(&self) -> &Array2<usize> {
        &self.grid
    }

    /// The pair label at `location`, `0` if the cell is unused.
    pub fn label_at(&self, location: Location) -> usize {
        self.grid[location.as_index()]
    }

    /// Total occupied cells across all pairs.
    pub fn cost(&self) -> usize {
        self.grid.iter().filter(|&&label| label != 0).count()
    }

    /// Reconstruct pair `pair`'s path as an ordered cell sequence from its first
    /// terminal to its second.
    ///
    /// The walk is a depth-first search over unvisited same-label neighbors, so it
    /// cannot be trapped by a path that doubles back on itself the way a greedy
    /// single-step walk can. Fails only if the labeled cells hold no simple path
    /// between the terminals at all, which a well-formed model never produces.
    pub fn trace_path(&self, pair: usize) -> Result<Vec<Location>, DecodeError> {
        let Pair(start, goal) = self.pairs[pair];
        let mut path = vec![start];
        let mut visited = HashSet::from([start]);

        if self.extend(pair + 1, goal, &mut path, &mut visited) {
            Ok(path)
        } else {
            Err(DecodeError::PathNotFound { pair })
        }
    }

    fn extend(
        &self,
        label: usize,
        goal: Location,
        path: &mut Vec<Location>,
        visited: &mut HashSet<Location>,
    ) -> bool {
        let here = *path.last().unwrap();
        if here == goal {
            return true;
        }

        for step in Step::VARIANTS {
            let next = step.attempt_from(here);
            if next.0 >= self.grid.ncols() || next.1 >= self.grid.nrows() {
                continue;
            }
            if visited.contains(&next) || self.grid[next.as_index()] != label {
                continue;
            }

            visited.insert(next);
            path.push(next);
            if self.extend(label, goal, path, visited) {
                return true;
            }
            path.pop();
            visited.remove(&next);
        }

        false
    }

    /// Rebuild this solution from its walked paths alone.
    ///
    /// An uncapped model may carry closed loops of active cells beside the true
    /// paths; walking every pair and keeping only visited cells drops them.
    pub fn walked(&self) -> Result<Self, DecodeError> {
        let mut grid = Array2::zeros(self.grid.raw_dim());
        for pair in 0..self.pairs.len() {
            for location in self.trace_path(pair)? {
                grid[location.as_index()] = pair + 1;
            }
        }

        Ok(Self { grid, pairs: self.pairs.clone() })
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let termini: HashSet<Location> = self.pairs.iter()
            .flat_map(|pair| [pair.0, pair.1])
            .collect();

        for y in 0..self.grid.nrows() {
            for x in 0..self.grid.ncols() {
                let location = Location(x, y);
                let glyph = match self.label_at(location) {
                    0 => '.',
                    label => {
                        // wraps past 26 pairs rather than running out of letters
                        let letter = (b'a' + ((label - 1) % 26) as u8) as char;
                        match termini.contains(&location) {
                            true => letter.to_ascii_uppercase(),
                            false => letter,
                        }
                    }
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
