//! SSA conversion: φ-placement over dominance frontiers, then Cytron-style
//! renaming down the dominator tree.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde_json::{Map, Value};

use crate::analysis::{Cfg, DomInfo};
use crate::bril;
use crate::ir::{BlockId, Function};

pub mod verify;

/// Stands in for a name that has no reaching definition.
pub const UNDEF: &str = "__undef";

pub fn to_ssa(func: &mut Function, cfg: &Cfg, dom: &DomInfo) {
    if func.blocks.is_empty() {
        return;
    }
    let phis = place_phis(func, dom);
    let mut renamer = Renamer::new(func, cfg, dom, phis);
    renamer.rename(func, cfg.entry());
    renamer.insert_phis(func);
}

/// Decides which blocks need a φ for which variables: every block in the
/// dominance frontier of a defining block, with φ-induced definitions fed
/// back through a worklist.
fn place_phis(func: &Function, dom: &DomInfo) -> Vec<BTreeSet<String>> {
    let mut defs: BTreeMap<String, BTreeSet<BlockId>> = BTreeMap::new();
    for block in &func.blocks {
        for inst in &block.insts {
            if let Some(dest) = &inst.dest {
                defs.entry(dest.clone()).or_default().insert(block.id);
            }
        }
    }

    let mut phis: Vec<BTreeSet<String>> = vec![BTreeSet::new(); func.blocks.len()];
    for (var, def_blocks) in defs {
        let mut work: VecDeque<BlockId> = def_blocks.iter().copied().collect();
        let mut def_blocks = def_blocks;
        while let Some(def_block) = work.pop_front() {
            for &frontier_block in dom.frontier(def_block) {
                if phis[frontier_block.index()].insert(var.clone())
                    && def_blocks.insert(frontier_block)
                {
                    work.push_back(frontier_block);
                }
            }
        }
    }
    phis
}

struct Renamer<'a> {
    cfg: &'a Cfg,
    dom: &'a DomInfo,
    phis: Vec<BTreeSet<String>>,
    /// Original variable name to its Bril type, for typing inserted φs.
    types: BTreeMap<String, Value>,
    counters: BTreeMap<String, usize>,
    stack: BTreeMap<String, Vec<String>>,
    phi_dests: Vec<BTreeMap<String, String>>,
    phi_args: Vec<BTreeMap<String, Vec<(BlockId, String)>>>,
}

impl<'a> Renamer<'a> {
    fn new(func: &Function, cfg: &'a Cfg, dom: &'a DomInfo, phis: Vec<BTreeSet<String>>) -> Self {
        // Parameters are definitions visible at entry: they seed the stacks
        // under their own names and keep their types for φ inference.
        let mut stack: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut types = BTreeMap::new();
        for param in &func.params {
            stack.insert(param.name.clone(), vec![param.name.clone()]);
            if let Some(ty) = &param.ty {
                types.insert(param.name.clone(), ty.clone());
            }
        }
        for block in &func.blocks {
            for inst in &block.insts {
                if let (Some(dest), Some(ty)) = (&inst.dest, &inst.ty) {
                    types.entry(dest.clone()).or_insert_with(|| ty.clone());
                }
            }
        }

        let block_count = func.blocks.len();
        Self {
            cfg,
            dom,
            phis,
            types,
            counters: BTreeMap::new(),
            stack,
            phi_dests: vec![BTreeMap::new(); block_count],
            phi_args: vec![BTreeMap::new(); block_count],
        }
    }

    /// Mints `var.N` and pushes it as the current definition of `var`.
    fn push_fresh(&mut self, var: &str) -> String {
        let counter = self.counters.entry(var.to_string()).or_insert(0);
        let fresh = format!("{var}.{counter}");
        *counter += 1;
        self.stack
            .entry(var.to_string())
            .or_default()
            .push(fresh.clone());
        fresh
    }

    fn top(&self, var: &str) -> String {
        self.stack
            .get(var)
            .and_then(|names| names.last())
            .cloned()
            .unwrap_or_else(|| UNDEF.to_string())
    }

    fn rename(&mut self, func: &mut Function, block: BlockId) {
        let saved_stack = self.stack.clone();

        let phi_vars: Vec<String> = self.phis[block.index()].iter().cloned().collect();
        for var in &phi_vars {
            let fresh = self.push_fresh(var);
            self.phi_dests[block.index()].insert(var.clone(), fresh);
        }

        for idx in 0..func.block(block).insts.len() {
            let inst = &func.block(block).insts[idx];
            let new_args: Option<Vec<String>> = inst
                .args
                .as_ref()
                .map(|args| args.iter().map(|arg| self.top(arg)).collect());
            let new_dest = inst.dest.clone().map(|dest| self.push_fresh(&dest));

            let inst = &mut func.block_mut(block).insts[idx];
            if new_args.is_some() {
                inst.args = new_args;
            }
            if new_dest.is_some() {
                inst.dest = new_dest;
            }
        }

        let cfg = self.cfg;
        for &succ in cfg.succs(block) {
            let vars: Vec<String> = self.phis[succ.index()].iter().cloned().collect();
            for var in vars {
                let reaching = self.top(&var);
                self.phi_args[succ.index()]
                    .entry(var)
                    .or_default()
                    .push((block, reaching));
            }
        }

        let dom = self.dom;
        for &child in dom.children(block) {
            self.rename(func, child);
        }

        self.stack = saved_stack;
    }

    /// Materializes the recorded φs, prepended per block in ascending
    /// variable order with `labels`/`args` paired pointwise.
    fn insert_phis(&self, func: &mut Function) {
        for idx in 0..func.blocks.len() {
            let mut new_phis = Vec::new();
            for (var, pairs) in &self.phi_args[idx] {
                let Some(dest) = self.phi_dests[idx].get(var) else {
                    continue;
                };
                let ty = self.types.get(var).cloned().unwrap_or_else(|| {
                    eprintln!(
                        "[WARN] no type known for `{var}`; phi in `{}` defaults to int",
                        func.blocks[idx].name
                    );
                    Value::String("int".to_string())
                });
                new_phis.push(bril::Instruction {
                    op: "phi".to_string(),
                    dest: Some(dest.clone()),
                    ty: Some(ty),
                    args: Some(pairs.iter().map(|(_, name)| name.clone()).collect()),
                    labels: Some(
                        pairs
                            .iter()
                            .map(|(pred, _)| func.block(*pred).name.clone())
                            .collect(),
                    ),
                    extra: Map::new(),
                });
            }
            func.blocks[idx].insts.splice(0..0, new_phis);
        }
    }
}

#[cfg(test)]
#[path = "../tests/t_ssa.rs"]
mod tests;
