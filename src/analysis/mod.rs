//! Per-function analyses: control-flow graph and dominator information.

pub mod cfg;
pub mod dom;

pub use cfg::{Cfg, CfgError};
pub use dom::{DomError, DomInfo};
