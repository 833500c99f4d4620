use std::collections::HashMap;

use crate::error::ValidationError;
use crate::location::{Dimension, Location};

/// One routing request: connect `.0` to `.1` with a simple path.
///
/// The walk in [`Solution::trace_path`](crate::Solution::trace_path) starts from `.0`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pair(pub Location, pub Location);

/// A validated routing instance: grid extents plus the ordered terminal pairs.
///
/// Construction via [`Problem::new`] is the only validation gate; a `Problem` that
/// exists is well-formed and immutable.
#[derive(Clone, Debug)]
pub struct Problem {
    dims: (Dimension, Dimension),
    pairs: Vec<Pair>,
}

impl Problem {
    /// Validate and build an instance over a grid of the given `(x, y)` extents.
    ///
    /// Rejects terminals outside the grid, pairs whose two terminals coincide, any
    /// cell claimed as a terminal by more than one pair, and an empty pair list.
    pub fn new(dims: (Dimension, Dimension), pairs: Vec<Pair>) -> Result<Self, ValidationError> {
        if pairs.is_empty() {
            return Err(ValidationError::NoPairs);
        }

        let mut claimed: HashMap<Location, usize> = HashMap::with_capacity(pairs.len() * 2);
        for (index, pair) in pairs.iter().enumerate() {
            for terminal in [pair.0, pair.1] {
                if !terminal.in_bounds(dims) {
                    return Err(ValidationError::OutOfBounds {
                        pair: index,
                        terminal,
                        n: dims.0.get(),
                        m: dims.1.get(),
                    });
                }
            }

            if pair.0 == pair.1 {
                return Err(ValidationError::CoincidentTerminals { pair: index, terminal: pair.0 });
            }

            for terminal in [pair.0, pair.1] {
                if let Some(&first) = claimed.get(&terminal) {
                    return Err(ValidationError::SharedTerminal { terminal, first, second: index });
                }
                claimed.insert(terminal, index);
            }
        }

        Ok(Self { dims, pairs })
    }

    /// Grid extents in `(x, y)` order.
    pub fn dims(&self) -> (Dimension, Dimension) {
        self.dims
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.dims.0.get()
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.dims.1.get()
    }

    /// Total cell count, which is also the loosest usable cost cap.
    pub fn cells(&self) -> usize {
        self.width() * self.height()
    }

    /// The terminal pairs, in the order given at construction.
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// A provable lower bound on total occupied cells: each pair needs at least its
    /// Manhattan distance plus one cell.
    pub fn lower_bound(&self) -> usize {
        self.pairs.iter()
            .map(|pair| pair.0.manhattan_to(pair.1) + 1)
            .sum()
    }

    /// Map from terminal cell to the index of the pair that owns it.
    ///
    /// Built once per instance and queried by membership while encoding; terminals
    /// are unique across pairs by validation, so the map is total over terminals.
    pub(crate) fn terminal_owners(&self) -> HashMap<Location, usize> {
        self.pairs.iter()
            .enumerate()
            .flat_map(|(index, pair)| [(pair.0, index), (pair.1, index)])
            .collect()
    }
}
