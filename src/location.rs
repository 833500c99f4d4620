use std::fmt::{Display, Formatter};
use std::num::NonZero;

use itertools::Itertools;
use strum::VariantArray;

type Coord = usize;
/// One extent of a grid; grids must be at least 1x1.
pub type Dimension = NonZero<Coord>;

#[derive(Clone, Eq, Hash, Copy, PartialEq, Ord, PartialOrd, Debug)]
/// A location `(x, y)` on a grid. The top left corner is `Location(0, 0)`.
pub struct Location(pub Coord, pub Coord);

impl Location {
    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self(self.0.wrapping_add_signed(rhs.0), self.1.wrapping_add_signed(rhs.1))
    }

    pub(crate) fn in_bounds(&self, dims: (Dimension, Dimension)) -> bool {
        self.0 < dims.0.get() && self.1 < dims.1.get()
    }

    /// `(row, column)` indexing into the solution array, which is stored row-major.
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.1, self.0)
    }

    pub(crate) fn manhattan_to(&self, other: Location) -> usize {
        self.0.abs_diff(other.0) + self.1.abs_diff(other.1)
    }

    /// All in-grid 4-neighbors of this location, in left, up, right, down order.
    pub(crate) fn neighbors(&self, dims: (Dimension, Dimension)) -> Vec<Location> {
        Step::VARIANTS.iter()
            .map(|step| step.attempt_from(*self))
            .filter(|location| location.in_bounds(dims))
            .collect_vec()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// The four cardinal steps between square cells.
///
/// Declaration order fixes the neighbor enumeration order everywhere, including the
/// order of terms emitted into constraints.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub(crate) enum Step {
    Left,
    Up,
    Right,
    Down,
}

impl Step {
    /// Attempt the step from `location` in the direction specified by `self`.
    ///
    /// Steps off the top or left edge wrap to huge coordinates, which
    /// [`Location::in_bounds`] rejects.
    pub(crate) fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Left => location.offset_by((-1, 0)),
            Self::Up => location.offset_by((0, -1)),
            Self::Right => location.offset_by((1, 0)),
            Self::Down => location.offset_by((0, 1)),
        }
    }
}
