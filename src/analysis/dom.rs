//! Dominator information: dominator sets, immediate dominators, dominance
//! frontiers, and the dominator tree.
//!
//! Dominator sets are kept as ordered sequences in reverse postorder so
//! every derived structure iterates deterministically.

use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::analysis::cfg::Cfg;
use crate::ir::{BlockId, Function, InstRef};

#[derive(Debug, Clone, Error)]
pub enum DomError {
    #[error(
        "function `{func}`, block `{block}`: immediate-dominator candidates did not reduce to one"
    )]
    AmbiguousIdom { func: String, block: String },
}

pub struct DomInfo {
    rpo: Vec<BlockId>,
    /// All dominators of each block, the block itself included.
    dom: Vec<Vec<BlockId>>,
    idom: Vec<Option<BlockId>>,
    df: Vec<Vec<BlockId>>,
    dom_tree: Vec<Vec<BlockId>>,
}

impl DomInfo {
    pub fn compute(func: &Function, cfg: &Cfg) -> Result<Self, DomError> {
        let rpo = cfg.rpo();
        let dom = compute_dominators(cfg, &rpo);
        let idom = compute_idoms(func, &dom)?;
        let df = compute_frontiers(cfg, &dom);
        let dom_tree = compute_dom_tree(&dom);
        Ok(Self {
            rpo,
            dom,
            idom,
            df,
            dom_tree,
        })
    }

    pub fn rpo(&self) -> &[BlockId] {
        &self.rpo
    }

    /// Blocks dominating `block`, itself included, in reverse postorder.
    pub fn dom(&self, block: BlockId) -> &[BlockId] {
        &self.dom[block.index()]
    }

    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        self.idom[block.index()]
    }

    pub fn frontier(&self, block: BlockId) -> &[BlockId] {
        &self.df[block.index()]
    }

    /// Children of `block` in the dominator tree.
    pub fn children(&self, block: BlockId) -> &[BlockId] {
        &self.dom_tree[block.index()]
    }

    pub fn dominates_block(&self, a: BlockId, b: BlockId) -> bool {
        self.dom[b.index()].contains(&a)
    }

    pub fn strictly_dominates_block(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates_block(a, b)
    }

    /// Whether instruction `a` dominates instruction `b`: within one block,
    /// `a` must come first; across blocks, `a`'s block must strictly
    /// dominate `b`'s.
    pub fn dominates_inst(&self, a: InstRef, b: InstRef) -> bool {
        if a.block == b.block {
            return a.idx < b.idx;
        }
        self.strictly_dominates_block(a.block, b.block)
    }

    pub fn format(&self, func: &Function) -> String {
        let names = |blocks: &[BlockId]| -> String {
            let names: Vec<&str> = blocks
                .iter()
                .map(|block| func.block(*block).name.as_str())
                .collect();
            names.join(", ")
        };

        let mut out = String::new();
        for block in &func.blocks {
            let idom = match self.idom(block.id) {
                Some(idom) => func.block(idom).name.clone(),
                None => "-".to_string(),
            };
            writeln!(
                out,
                "{}: dom=[{}] idom={} df=[{}] children=[{}]",
                block.name,
                names(self.dom(block.id)),
                idom,
                names(self.frontier(block.id)),
                names(self.children(block.id)),
            )
            .unwrap();
        }
        out
    }
}

/// Iterative dataflow over reverse postorder: `dom[entry] = {entry}`, all
/// other blocks start at the full block list and shrink to a fixpoint of
/// `dom[b] = (⋂ preds' dom) ∪ {b}`. Intersection keeps the order of its
/// first operand, so the sets stay in reverse postorder.
fn compute_dominators(cfg: &Cfg, rpo: &[BlockId]) -> Vec<Vec<BlockId>> {
    let count = cfg.blocks().len();
    let mut dom: Vec<Vec<BlockId>> = vec![rpo.to_vec(); count];
    if count > 0 {
        dom[cfg.entry().index()] = vec![cfg.entry()];
    }

    loop {
        let mut changed = false;
        for &block in rpo {
            let preds = cfg.preds(block);
            let mut new_dom: Vec<BlockId> = match preds.split_first() {
                Some((first, rest)) => {
                    let mut acc = dom[first.index()].clone();
                    for pred in rest {
                        let pred_dom = &dom[pred.index()];
                        acc.retain(|candidate| pred_dom.contains(candidate));
                    }
                    acc
                }
                None => Vec::new(),
            };
            if !new_dom.contains(&block) {
                new_dom.push(block);
            }

            if new_dom != dom[block.index()] {
                dom[block.index()] = new_dom;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    dom
}

/// For each block, the strict dominators are candidates; the immediate
/// dominator is the one not dominated by any other candidate.
fn compute_idoms(func: &Function, dom: &[Vec<BlockId>]) -> Result<Vec<Option<BlockId>>, DomError> {
    let mut idom = vec![None; dom.len()];

    for (idx, block_dom) in dom.iter().enumerate() {
        let block = BlockId(idx as u32);
        let mut candidates: Vec<BlockId> = block_dom
            .iter()
            .copied()
            .filter(|&dominator| dominator != block)
            .collect();

        if candidates.is_empty() {
            // The entry, or an isolated unreachable block.
            continue;
        }
        if candidates.len() == 1 {
            idom[idx] = Some(candidates[0]);
            continue;
        }

        let mut dominated_elsewhere: HashSet<BlockId> = HashSet::new();
        for &candidate in &candidates {
            for &dominator in &dom[candidate.index()] {
                if dominator != candidate {
                    dominated_elsewhere.insert(dominator);
                }
            }
        }
        candidates.retain(|candidate| !dominated_elsewhere.contains(candidate));

        debug_assert!(candidates.len() <= 1, "corrupt dominator sets");
        if candidates.len() > 1 {
            return Err(DomError::AmbiguousIdom {
                func: func.name.clone(),
                block: func.blocks[idx].name.clone(),
            });
        }
        idom[idx] = candidates.pop();
    }

    Ok(idom)
}

/// `y` is in `df[x]` iff `x` dominates a predecessor of `y` but does not
/// strictly dominate `y`. Computed by inverting `dom` into "blocks
/// dominated by x" and filtering the union of their successors.
fn compute_frontiers(cfg: &Cfg, dom: &[Vec<BlockId>]) -> Vec<Vec<BlockId>> {
    let dominated = invert(dom);

    let mut df: Vec<Vec<BlockId>> = vec![Vec::new(); dom.len()];
    for (idx, dominated_blocks) in dominated.iter().enumerate() {
        let block = BlockId(idx as u32);
        let mut candidate_succs: Vec<BlockId> = Vec::new();
        for &dominated_block in dominated_blocks {
            for &succ in cfg.succs(dominated_block) {
                if !candidate_succs.contains(&succ) {
                    candidate_succs.push(succ);
                }
            }
        }
        for &succ in &candidate_succs {
            if succ == block || !dominated_blocks.contains(&succ) {
                df[idx].push(succ);
            }
        }
    }
    df
}

/// Children of `a` are the blocks strictly dominated by `a` but not by any
/// other block `a` strictly dominates.
fn compute_dom_tree(dom: &[Vec<BlockId>]) -> Vec<Vec<BlockId>> {
    let mut strict = invert(dom);
    for (idx, dominated_blocks) in strict.iter_mut().enumerate() {
        dominated_blocks.retain(|&block| block.index() != idx);
    }

    let mut tree: Vec<Vec<BlockId>> = vec![Vec::new(); dom.len()];
    for idx in 0..strict.len() {
        let mut twice_removed: HashSet<BlockId> = HashSet::new();
        for dominated in &strict[idx] {
            for &transitively in &strict[dominated.index()] {
                twice_removed.insert(transitively);
            }
        }
        tree[idx] = strict[idx]
            .iter()
            .copied()
            .filter(|block| !twice_removed.contains(block))
            .collect();
    }
    tree
}

/// Inverts "dominators of b" into "blocks dominated by a". Iterating block
/// indices in order keeps every inverted list in function block order.
fn invert(dom: &[Vec<BlockId>]) -> Vec<Vec<BlockId>> {
    let mut inverted: Vec<Vec<BlockId>> = vec![Vec::new(); dom.len()];
    for (idx, dominators) in dom.iter().enumerate() {
        for dominator in dominators {
            inverted[dominator.index()].push(BlockId(idx as u32));
        }
    }
    inverted
}

#[cfg(test)]
#[path = "../tests/t_dom.rs"]
mod tests;
