//! Built per-function IR: labeled basic blocks over the JSON-level model.

pub mod builder;
pub mod format;
pub mod function;

pub use builder::{BuildError, FunctionBuilder};
pub use format::format_function;
pub use function::{BasicBlock, BlockId, Function, InstRef, ENTRY_BLOCK_NAME};
