//! brilopt: a Bril middle-end.
//!
//! Reads JSON-encoded Bril, builds basic blocks and a CFG per function,
//! computes dominator information, converts to SSA, runs CSE, copy
//! propagation, and dead-instruction elimination, and writes the functions
//! back out as JSON.

pub mod analysis;
pub mod bril;
pub mod diag;
pub mod driver;
pub mod ir;
pub mod opt;
pub mod ssa;
