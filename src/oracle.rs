//! The seam to the external pseudo-Boolean solver process.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::encode::ConstraintSystem;
use crate::error::OracleError;

/// The boundary to the external pseudo-Boolean solver.
///
/// Implementations take a finished [`ConstraintSystem`], consult the solver
/// synchronously, and return its raw textual output for the decoder to interpret.
/// A failure here is a configuration problem, never something to retry.
pub trait Oracle {
    /// Block until the solver answers, returning its raw output.
    fn invoke(&mut self, system: &ConstraintSystem) -> Result<String, OracleError>;
}

/// An [`Oracle`] backed by a solver executable in the `pbsolver` calling convention:
/// the instance file path as the first argument and the literal mode flag `model`
/// requesting a witnessing assignment on success.
///
/// The instance file is fully overwritten before every invocation, so one
/// `PbSolverCommand` can serve an entire optimization run; sharing the same
/// instance path between concurrent runs is unsupported.
pub struct PbSolverCommand {
    solver: PathBuf,
    instance: PathBuf,
}

impl PbSolverCommand {
    /// Adapter running `solver`, keeping the serialized instance at `instance`.
    pub fn new(solver: impl Into<PathBuf>, instance: impl Into<PathBuf>) -> Self {
        Self { solver: solver.into(), instance: instance.into() }
    }

    /// Path of the instance file this adapter writes.
    pub fn instance_path(&self) -> &Path {
        &self.instance
    }
}

impl Oracle for PbSolverCommand {
    fn invoke(&mut self, system: &ConstraintSystem) -> Result<String, OracleError> {
        std::fs::write(&self.instance, system.to_string())
            .map_err(|source| OracleError::InstanceWrite { path: self.instance.clone(), source })?;

        debug!(solver = %self.solver.display(), instance = %self.instance.display(), "invoking solver");
        let output = Command::new(&self.solver)
            .arg(&self.instance)
            .arg("model")
            .output()
            .map_err(|source| OracleError::Launch { path: self.solver.clone(), source })?;

        if !output.status.success() && output.stdout.is_empty() {
            return Err(OracleError::AbnormalExit {
                path: self.solver.clone(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
