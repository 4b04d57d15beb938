//! Scalar optimization passes over built functions.

use thiserror::Error;

use crate::analysis::{CfgError, DomError};
use crate::ir::Function;

pub mod copy_prop;
pub mod cse;
pub mod dce;

#[derive(Debug, Clone, Error)]
pub enum PassError {
    #[error(transparent)]
    Cfg(#[from] CfgError),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// An in-place rewrite of one function. Returns whether anything changed.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&mut self, func: &mut Function) -> Result<bool, PassError>;
}

/// Runs the standard pass order: CSE introduces `id` copies, copy
/// propagation collapses the chains, and dead-instruction elimination
/// sweeps up what is left.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(cse::CommonSubexprElim),
                Box::new(copy_prop::CopyProp),
                Box::new(dce::DeadInstElim),
            ],
        }
    }

    pub fn run(&mut self, func: &mut Function) -> Result<bool, PassError> {
        let mut changed = false;
        for pass in &mut self.passes {
            changed |= pass.run(func)?;
        }
        Ok(changed)
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/t_opt.rs"]
mod tests;
