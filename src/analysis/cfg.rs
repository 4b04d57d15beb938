//! Control-flow graph for a single built function.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ir::{BlockId, Function};

#[derive(Debug, Clone, Error)]
pub enum CfgError {
    #[error("function `{func}`: block `{block}` has no instructions")]
    EmptyBlock { func: String, block: String },
    #[error("function `{func}`: block `{block}` branches to unknown label `{target}`")]
    UnknownTarget {
        func: String,
        block: String,
        target: String,
    },
}

/// Successor and predecessor edges, keyed by block index.
///
/// Successors follow the terminator: `jmp`/`br` edges point at their labels
/// in label order (duplicates retained), `ret` ends the function, and a
/// block without a terminator falls through to the textually next block.
pub struct Cfg {
    entry: BlockId,
    blocks: Vec<BlockId>,
    preds: Vec<Vec<BlockId>>,
    succs: Vec<Vec<BlockId>>,
}

impl Cfg {
    pub fn build(func: &Function) -> Result<Self, CfgError> {
        let count = func.blocks.len();
        let mut preds = vec![Vec::new(); count];
        let mut succs = vec![Vec::new(); count];

        for (idx, block) in func.blocks.iter().enumerate() {
            let last = block.insts.last().ok_or_else(|| CfgError::EmptyBlock {
                func: func.name.clone(),
                block: block.name.clone(),
            })?;

            let mut block_succs = Vec::new();
            match last.op.as_str() {
                "jmp" | "br" => {
                    for target in last.labels() {
                        let target_id = func.block_by_name(target).ok_or_else(|| {
                            CfgError::UnknownTarget {
                                func: func.name.clone(),
                                block: block.name.clone(),
                                target: target.clone(),
                            }
                        })?;
                        block_succs.push(target_id);
                    }
                }
                "ret" => {}
                _ => {
                    // Fall through, textually.
                    if idx + 1 < count {
                        block_succs.push(BlockId((idx + 1) as u32));
                    }
                }
            }

            for succ in &block_succs {
                preds[succ.index()].push(block.id);
            }
            succs[idx] = block_succs;
        }

        Ok(Self {
            entry: BlockId(0),
            blocks: (0..count).map(|idx| BlockId(idx as u32)).collect(),
            preds,
            succs,
        })
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn preds(&self, block: BlockId) -> &[BlockId] {
        &self.preds[block.index()]
    }

    pub fn succs(&self, block: BlockId) -> &[BlockId] {
        &self.succs[block.index()]
    }

    /// Returns postorder for the reachable portion of the CFG.
    pub fn postorder(&self) -> Vec<BlockId> {
        let mut visited = vec![false; self.blocks.len()];
        let mut order = Vec::new();
        if !self.blocks.is_empty() {
            self.dfs(self.entry, &mut visited, &mut order);
        }
        order
    }

    /// Returns reverse postorder from the entry, with unreachable blocks
    /// appended afterward in function order so every block appears once.
    pub fn rpo(&self) -> Vec<BlockId> {
        let mut visited = vec![false; self.blocks.len()];
        let mut order = Vec::new();
        if !self.blocks.is_empty() {
            self.dfs(self.entry, &mut visited, &mut order);
        }
        order.reverse();
        for (idx, seen) in visited.iter().enumerate() {
            if !seen {
                order.push(BlockId(idx as u32));
            }
        }
        order
    }

    fn dfs(&self, block: BlockId, visited: &mut [bool], order: &mut Vec<BlockId>) {
        if visited[block.index()] {
            return;
        }
        visited[block.index()] = true;

        for succ in self.succs(block) {
            self.dfs(*succ, visited, order);
        }

        order.push(block);
    }

    pub fn format(&self, func: &Function) -> String {
        let mut out = String::new();
        for &block in &self.blocks {
            let succs: Vec<&str> = self
                .succs(block)
                .iter()
                .map(|succ| func.block(*succ).name.as_str())
                .collect();
            writeln!(out, "{} -> [{}]", func.block(block).name, succs.join(", ")).unwrap();
        }
        out
    }

    /// Writes `<function-name>.dot` under `dir`: blue successor edges, red
    /// predecessor edges.
    pub fn write_dot(&self, func: &Function, dir: &Path) -> std::io::Result<PathBuf> {
        let mut out = String::new();
        writeln!(out, "digraph \"{}\" {{", func.name).unwrap();
        writeln!(out, "node [shape=box, style=filled]").unwrap();
        for block in &func.blocks {
            writeln!(out, "\"{}\"", block.name).unwrap();
        }
        for &block in &self.blocks {
            for succ in self.succs(block) {
                writeln!(
                    out,
                    "\"{}\" -> \"{}\" [color=\"blue\"]",
                    func.block(block).name,
                    func.block(*succ).name
                )
                .unwrap();
            }
        }
        for &block in &self.blocks {
            for pred in self.preds(block) {
                writeln!(
                    out,
                    "\"{}\" -> \"{}\" [color=\"red\"]",
                    func.block(block).name,
                    func.block(*pred).name
                )
                .unwrap();
            }
        }
        out.push('}');

        let path = dir.join(format!("{}.dot", func.name));
        std::fs::write(&path, out)?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../tests/t_cfg.rs"]
mod tests;
