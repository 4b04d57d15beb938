//! Pipeline error taxonomy.
//!
//! Malformed input aborts the offending function and the run continues;
//! anything else (a broken analysis invariant, a failed verify, IO) halts
//! the run.

use thiserror::Error;

use crate::analysis::{CfgError, DomError};
use crate::ir::BuildError;
use crate::opt::PassError;
use crate::ssa::verify::VerifyError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed IR: {0}")]
    Build(#[from] BuildError),

    #[error("malformed IR: {0}")]
    Cfg(#[from] CfgError),

    #[error("invariant violation: {0}")]
    Dom(#[from] DomError),

    #[error("invariant violation: {0}")]
    Verify(#[from] VerifyError),

    #[error("invariant violation: {0}")]
    Pass(#[from] PassError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a problem with the input rather than with us.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Build(_) | Error::Cfg(_))
    }
}
