//! Dominance-aware common-subexpression elimination.
//!
//! Groups value instructions by `(op, normalized args)`; within a group,
//! whenever one instruction dominates another, the dominated one becomes an
//! `id` copy of the dominator's destination. The resulting copy chains are
//! left for copy propagation and DIE.

use indexmap::IndexMap;

use crate::analysis::{Cfg, DomInfo};
use crate::ir::{Function, InstRef};
use crate::opt::{Pass, PassError};

const COMMUTATIVE_OPS: [&str; 4] = ["add", "mul", "+", "*"];

pub struct CommonSubexprElim;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Identity {
    op: String,
    args: Vec<String>,
}

impl Identity {
    fn new(op: &str, args: &[String]) -> Self {
        let mut args = args.to_vec();
        if COMMUTATIVE_OPS.contains(&op) {
            args.sort();
        }
        Self {
            op: op.to_string(),
            args,
        }
    }
}

impl Pass for CommonSubexprElim {
    fn name(&self) -> &'static str {
        "cse"
    }

    fn run(&mut self, func: &mut Function) -> Result<bool, PassError> {
        // The pass may run on IR whose CFG has changed since the last
        // analysis, so it recomputes both.
        let cfg = Cfg::build(func)?;
        let dom = DomInfo::compute(func, &cfg)?;

        let mut classes: IndexMap<Identity, Vec<InstRef>> = IndexMap::new();
        for block in &func.blocks {
            for (idx, inst) in block.insts.iter().enumerate() {
                // Only pure value computations are candidates. φs read on
                // their incoming edges, so equal arg lists do not make two
                // of them interchangeable.
                let Some(args) = &inst.args else { continue };
                if inst.dest.is_none() || inst.has_side_effect() || inst.op == "phi" {
                    continue;
                }
                classes
                    .entry(Identity::new(&inst.op, args))
                    .or_default()
                    .push(InstRef {
                        block: block.id,
                        idx,
                    });
            }
        }

        let mut changed = false;
        for members in classes.values() {
            if members.len() < 2 {
                continue;
            }
            for i in 0..members.len() {
                for j in i + 1..members.len() {
                    let (a, b) = (members[i], members[j]);
                    if dom.dominates_inst(a, b) {
                        changed |= rewrite_to_copy(func, b, a);
                    } else if dom.dominates_inst(b, a) {
                        changed |= rewrite_to_copy(func, a, b);
                    }
                }
            }
        }

        Ok(changed)
    }
}

/// Turns `victim` into `id <keeper.dest>`, keeping its own destination.
fn rewrite_to_copy(func: &mut Function, victim: InstRef, keeper: InstRef) -> bool {
    let Some(source) = func.inst(keeper).dest.clone() else {
        return false;
    };
    let inst = func.inst_mut(victim);
    inst.op = "id".to_string();
    inst.args = Some(vec![source]);
    true
}
