//! Partitions a function's instruction stream into basic blocks.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::bril;
use crate::ir::function::{BasicBlock, BlockId, Function, ENTRY_BLOCK_NAME};

#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("function `{func}`: duplicate block label `{label}`")]
    DuplicateLabel { func: String, label: String },
    #[error("function `{func}`: label `Entry` is reserved for a synthetic entry block")]
    ReservedLabel { func: String },
}

/// Builds a `Function` from the JSON-level instruction stream.
///
/// Walks `instrs` once, growing a current block: real instructions append to
/// it and a terminator seals it; a label seals any non-empty current block
/// and opens a new one carrying the label. Sealed blocks take their label as
/// their name, or a fresh `bb.N` when anonymous.
pub struct FunctionBuilder {
    next_name: u32,
}

struct PendingBlock {
    label: Option<bril::Label>,
    insts: Vec<bril::Instruction>,
}

impl PendingBlock {
    fn new() -> Self {
        Self {
            label: None,
            insts: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.label.is_none() && self.insts.is_empty()
    }
}

impl FunctionBuilder {
    pub fn new() -> Self {
        // Synthetic names are numbered from 1 within each function.
        Self { next_name: 1 }
    }

    pub fn build(mut self, func: bril::Function) -> Result<Function, BuildError> {
        let bril::Function {
            name,
            args,
            instrs,
            extra,
        } = func;

        let mut pending = Vec::new();
        let mut cur = PendingBlock::new();
        for code in instrs {
            match code {
                bril::Code::Instr(inst) => {
                    let seal = inst.is_terminator();
                    cur.insts.push(inst);
                    if seal {
                        pending.push(std::mem::replace(&mut cur, PendingBlock::new()));
                    }
                }
                bril::Code::Label(label) => {
                    if !cur.is_empty() {
                        pending.push(std::mem::replace(&mut cur, PendingBlock::new()));
                    }
                    cur.label = Some(label);
                }
            }
        }
        if !cur.is_empty() {
            pending.push(cur);
        }

        let mut blocks = Vec::with_capacity(pending.len());
        let mut block_index = HashMap::with_capacity(pending.len());
        for block in pending {
            let id = BlockId(blocks.len() as u32);
            let (block_name, label_extra) = match block.label {
                Some(label) => {
                    if label.label == ENTRY_BLOCK_NAME {
                        return Err(BuildError::ReservedLabel { func: name });
                    }
                    (label.label, label.extra)
                }
                None => (self.fresh_name(), Map::<String, Value>::new()),
            };
            if block_index.insert(block_name.clone(), id).is_some() {
                return Err(BuildError::DuplicateLabel {
                    func: name,
                    label: block_name,
                });
            }
            blocks.push(BasicBlock {
                id,
                name: block_name,
                insts: block.insts,
                label_extra,
            });
        }

        Ok(Function::new(name, args, blocks, block_index, extra))
    }

    fn fresh_name(&mut self) -> String {
        let name = format!("bb.{}", self.next_name);
        self.next_name += 1;
        name
    }
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/t_builder.rs"]
mod tests;
