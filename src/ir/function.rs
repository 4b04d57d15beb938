//! Function and basic-block data model.
//!
//! Blocks live in a flat vector owned by the function; `BlockId` is a stable
//! index into it and `InstRef` addresses one instruction within one block.
//! Analyses key their maps on these indices instead of holding references.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::bril;

/// Reserved name for a synthetic entry block. The builder never creates one
/// and rejects source labels that use it.
pub const ENTRY_BLOCK_NAME: &str = "Entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of one instruction inside a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstRef {
    pub block: BlockId,
    pub idx: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub name: String,
    pub insts: Vec<bril::Instruction>,
    /// Extra fields carried on the source label marker, if the block had one.
    pub label_extra: Map<String, Value>,
}

impl BasicBlock {
    /// The block's terminator, if its last instruction is one.
    pub fn terminator(&self) -> Option<&bril::Instruction> {
        self.insts.last().filter(|inst| inst.is_terminator())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<bril::FuncArg>,
    pub blocks: Vec<BasicBlock>,
    block_index: HashMap<String, BlockId>,
    /// Function-level fields the pipeline does not interpret (e.g. `type`).
    pub extra: Map<String, Value>,
}

impl Function {
    pub fn new(
        name: String,
        params: Vec<bril::FuncArg>,
        blocks: Vec<BasicBlock>,
        block_index: HashMap<String, BlockId>,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            name,
            params,
            blocks,
            block_index,
            extra,
        }
    }

    /// The entry block is the first block built.
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.block_index.get(name).copied()
    }

    pub fn inst(&self, at: InstRef) -> &bril::Instruction {
        &self.block(at.block).insts[at.idx]
    }

    pub fn inst_mut(&mut self, at: InstRef) -> &mut bril::Instruction {
        &mut self.block_mut(at.block).insts[at.idx]
    }

    /// Serializes back to the wire shape, with a `{"label": name}` marker in
    /// front of each block's instructions.
    pub fn to_bril(&self) -> bril::Function {
        let mut instrs = Vec::new();
        for block in &self.blocks {
            instrs.push(bril::Code::Label(bril::Label {
                label: block.name.clone(),
                extra: block.label_extra.clone(),
            }));
            instrs.extend(block.insts.iter().cloned().map(bril::Code::Instr));
        }
        bril::Function {
            name: self.name.clone(),
            args: self.params.clone(),
            instrs,
            extra: self.extra.clone(),
        }
    }
}
