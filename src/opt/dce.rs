//! Dead-instruction elimination.
//!
//! One pass over the function: any instruction whose destination is never
//! read anywhere is dropped. Side-effecting instructions are pinned even
//! when their results are unused.

use std::collections::HashSet;

use crate::bril;
use crate::ir::Function;
use crate::opt::{Pass, PassError};

pub struct DeadInstElim;

impl Pass for DeadInstElim {
    fn name(&self) -> &'static str {
        "die"
    }

    fn run(&mut self, func: &mut Function) -> Result<bool, PassError> {
        let mut used: HashSet<String> = HashSet::new();
        for block in &func.blocks {
            for inst in &block.insts {
                used.extend(inst.args().iter().cloned());
            }
        }

        let mut changed = false;
        for block in &mut func.blocks {
            let before = block.insts.len();
            block.insts.retain(|inst| should_keep(inst, &used));
            changed |= block.insts.len() != before;
        }

        Ok(changed)
    }
}

fn should_keep(inst: &bril::Instruction, used: &HashSet<String>) -> bool {
    if inst.has_side_effect() {
        return true;
    }
    match &inst.dest {
        Some(dest) => used.contains(dest),
        None => true,
    }
}
