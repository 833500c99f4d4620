//! Translation of a routing [`Problem`] into a pseudo-Boolean constraint system and
//! its OPB wire form.

use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::index::VarIndex;
use crate::location::Location;
use crate::problem::Problem;

/// A solver variable or its negation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Literal {
    variable: usize,
    negated: bool,
}

impl Literal {
    fn value(&self, assignment: &impl Fn(usize) -> bool) -> bool {
        assignment(self.variable) ^ self.negated
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "~x{}", self.variable)
        } else {
            write!(f, "x{}", self.variable)
        }
    }
}

/// One weighted literal inside a constraint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Term {
    coefficient: i64,
    literal: Literal,
}

impl Term {
    fn positive(variable: usize) -> Self {
        Self { coefficient: 1, literal: Literal { variable, negated: false } }
    }

    fn negative(variable: usize) -> Self {
        Self { coefficient: -1, literal: Literal { variable, negated: false } }
    }

    fn negated(coefficient: i64, variable: usize) -> Self {
        Self { coefficient, literal: Literal { variable, negated: true } }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+} {}", self.coefficient, self.literal)
    }
}

/// The relational operator of a pseudo-Boolean constraint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    /// `=`
    Equal,
    /// `>=`
    GreaterEqual,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterEqual => write!(f, ">="),
        }
    }
}

/// One linear pseudo-Boolean constraint, `Σ coefficient·literal ▷ constant`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    terms: Vec<Term>,
    relation: Relation,
    constant: i64,
}

impl Constraint {
    fn new(terms: Vec<Term>, relation: Relation, constant: i64) -> Self {
        Self { terms, relation, constant }
    }

    /// Whether this constraint holds under `assignment`, queried by variable id.
    pub fn holds(&self, assignment: &impl Fn(usize) -> bool) -> bool {
        let sum: i64 = self.terms.iter()
            .filter(|term| term.literal.value(assignment))
            .map(|term| term.coefficient)
            .sum();

        match self.relation {
            Relation::Equal => sum == self.constant,
            Relation::GreaterEqual => sum >= self.constant,
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {};", self.terms.iter().join(" "), self.relation, self.constant)
    }
}

/// A complete pseudo-Boolean instance: the minimization objective over every
/// variable plus the ordered constraint sequence.
///
/// Built fresh by [`ConstraintSystem::encode`] for every cost bound; never mutated in
/// place. [`Display`] renders the OPB wire format the external solver consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintSystem {
    variables: usize,
    constraints: Vec<Constraint>,
}

impl ConstraintSystem {
    /// Encode `problem` under the cost cap `c_max`.
    ///
    /// `c_max >= n*m` means no cap. The emitted constraints are, in order:
    /// per pair, occupancy of both terminals (`>= 1`) then exactly one active
    /// neighbor of each terminal (`= 1`); per cell, the pass-through biconditional
    /// for every pair not holding a terminal there, then the cell's disjointness
    /// constraint; finally the cap, if any. Boundary cells contribute only their
    /// in-grid neighbors.
    pub fn encode(problem: &Problem, c_max: usize) -> Self {
        let index = VarIndex::of(problem);
        let dims = problem.dims();
        let owners = problem.terminal_owners();
        let pairs = problem.pairs().len();

        let mut constraints = Vec::with_capacity(
            4 * pairs + 2 * (problem.cells() - 2) * pairs + problem.cells() + 1,
        );

        for (i, pair) in problem.pairs().iter().enumerate() {
            for terminal in [pair.0, pair.1] {
                constraints.push(Constraint::new(
                    vec![Term::positive(index.id(terminal, i))],
                    Relation::GreaterEqual,
                    1,
                ));
            }

            // a path leaves each terminal by exactly one neighbor
            for terminal in [pair.0, pair.1] {
                let terms = terminal.neighbors(dims).iter()
                    .map(|&neighbor| Term::positive(index.id(neighbor, i)))
                    .collect_vec();
                constraints.push(Constraint::new(terms, Relation::Equal, 1));
            }
        }

        for x in 0..problem.width() {
            for y in 0..problem.height() {
                let cell = Location(x, y);
                let neighbors = cell.neighbors(dims);

                for i in 0..pairs {
                    // terminal degree is handled above, for this cell's owning pair only
                    if owners.get(&cell) == Some(&i) {
                        continue;
                    }

                    let own = index.id(cell, i);

                    // active => at most two active neighbors (no branching)
                    let mut terms = neighbors.iter()
                        .map(|&neighbor| Term::negative(index.id(neighbor, i)))
                        .collect_vec();
                    terms.push(Term::negated(3, own));
                    constraints.push(Constraint::new(terms, Relation::GreaterEqual, -2));

                    // active => at least two active neighbors (paths continue)
                    let mut terms = neighbors.iter()
                        .map(|&neighbor| Term::positive(index.id(neighbor, i)))
                        .collect_vec();
                    terms.push(Term::negated(3, own));
                    constraints.push(Constraint::new(terms, Relation::GreaterEqual, 2));
                }

                // at most one pair occupies any cell
                let terms = (0..pairs)
                    .map(|i| Term::negative(index.id(cell, i)))
                    .collect_vec();
                constraints.push(Constraint::new(terms, Relation::GreaterEqual, -1));
            }
        }

        if c_max < problem.cells() {
            let terms = (1..=index.variables())
                .map(Term::negative)
                .collect_vec();
            constraints.push(Constraint::new(terms, Relation::GreaterEqual, -(c_max as i64)));
        }

        Self { variables: index.variables(), constraints }
    }

    /// Total variable count, as announced in the instance header.
    pub fn variables(&self) -> usize {
        self.variables
    }

    /// The emitted constraints, in emission order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether every constraint holds under `assignment`, queried by variable id.
    pub fn satisfied_by(&self, assignment: impl Fn(usize) -> bool) -> bool {
        self.constraints.iter().all(|constraint| constraint.holds(&assignment))
    }
}

impl Display for ConstraintSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "* #variable= {} #constraint= {}", self.variables, self.constraints.len())?;
        writeln!(f, "min: {};", (1..=self.variables).map(Term::positive).join(" "))?;
        for constraint in &self.constraints {
            writeln!(f, "{}", constraint)?;
        }

        Ok(())
    }
}
