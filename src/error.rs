//! Everything that can go wrong, from rejected input to solver output that cannot
//! be interpreted.

use std::path::PathBuf;

use thiserror::Error;

use crate::location::Location;

/// Reasons a problem instance is rejected before any encoding work begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A terminal lies outside the grid.
    #[error("terminal {terminal} of pair {pair} lies outside the {n}x{m} grid")]
    OutOfBounds {
        /// Index of the offending pair.
        pair: usize,
        /// The out-of-bounds coordinate.
        terminal: Location,
        /// Grid width.
        n: usize,
        /// Grid height.
        m: usize,
    },
    /// A pair names the same cell as both of its terminals.
    #[error("pair {pair} has coincident terminals at {terminal}")]
    CoincidentTerminals {
        /// Index of the offending pair.
        pair: usize,
        /// The repeated coordinate.
        terminal: Location,
    },
    /// Two pairs claim the same cell as a terminal.
    #[error("terminal {terminal} is shared by pairs {first} and {second}")]
    SharedTerminal {
        /// The contested coordinate.
        terminal: Location,
        /// Index of the pair that claimed the cell first.
        first: usize,
        /// Index of the later pair.
        second: usize,
    },
    /// No pairs were given, so there is nothing to route.
    #[error("no terminal pairs were given")]
    NoPairs,
}

/// Reasons the external solver could not be consulted at all.
///
/// These are configuration failures and are never retried.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The instance file could not be (over)written.
    #[error("failed to write instance file {path}: {source}")]
    InstanceWrite {
        /// Path of the instance file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The solver process could not be launched or its output collected.
    #[error("failed to run solver {path}: {source}")]
    Launch {
        /// Path of the solver executable.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The solver exited abnormally without producing any output to interpret.
    #[error("solver {path} exited with {status} and produced no output")]
    AbnormalExit {
        /// Path of the solver executable.
        path: PathBuf,
        /// The process exit status.
        status: std::process::ExitStatus,
    },
}

/// Reasons solver output could not be interpreted.
///
/// A well-formed model from a correctly built constraint system always decodes, so
/// any of these indicates an encoding defect or a misbehaving solver rather than a
/// normal runtime condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// No `s ` status line was found in the solver output.
    #[error("solver output contains no status line")]
    MissingStatus,
    /// The status line reported satisfiable but no `v ` model line followed.
    #[error("solver output contains no model line")]
    MissingModel,
    /// A token on the model line is neither `x<id>` nor `~x<id>`.
    #[error("malformed literal token {token:?} on model line")]
    BadLiteral {
        /// The offending token.
        token: String,
    },
    /// A model literal names a variable outside the instance's id range.
    #[error("model names variable {id}, outside 1..={max}")]
    IdOutOfRange {
        /// The out-of-range id.
        id: usize,
        /// Largest valid id for this instance.
        max: usize,
    },
    /// No simple path over a pair's labeled cells connects its terminals.
    #[error("no simple path connects the terminals of pair {pair}")]
    PathNotFound {
        /// Index of the pair that could not be walked.
        pair: usize,
    },
}

/// Umbrella error for routing runs, covering both collaborator failure modes.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The external solver could not be consulted.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// The solver's output could not be interpreted.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
