//! Post-conversion SSA checks: unique definitions and uses dominated by
//! their definitions.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::analysis::DomInfo;
use crate::ir::{Function, InstRef};
use crate::ssa::UNDEF;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct VerifyError {
    message: String,
}

pub fn verify_function(func: &Function, dom: &DomInfo) -> Result<(), VerifyError> {
    let mut defs: HashMap<&str, InstRef> = HashMap::new();
    for block in &func.blocks {
        for (idx, inst) in block.insts.iter().enumerate() {
            if let Some(dest) = &inst.dest {
                let at = InstRef {
                    block: block.id,
                    idx,
                };
                if defs.insert(dest, at).is_some() {
                    return Err(err(
                        func,
                        &block.name,
                        format!("`{dest}` is defined more than once"),
                    ));
                }
            }
        }
    }

    let params: HashSet<&str> = func
        .params
        .iter()
        .map(|param| param.name.as_str())
        .collect();

    for block in &func.blocks {
        for (idx, inst) in block.insts.iter().enumerate() {
            // φ operands are read on the incoming edge, not here.
            if inst.op == "phi" {
                continue;
            }
            let use_site = InstRef {
                block: block.id,
                idx,
            };
            for arg in inst.args() {
                if arg == UNDEF || params.contains(arg.as_str()) {
                    continue;
                }
                let Some(&def_site) = defs.get(arg.as_str()) else {
                    return Err(err(
                        func,
                        &block.name,
                        format!("use of undefined name `{arg}`"),
                    ));
                };
                if !dom.dominates_inst(def_site, use_site) {
                    return Err(err(
                        func,
                        &block.name,
                        format!("definition of `{arg}` does not dominate its use"),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn err(func: &Function, block: &str, message: impl Into<String>) -> VerifyError {
    VerifyError {
        message: format!(
            "ssa verify: function `{}`, block `{}`: {}",
            func.name,
            block,
            message.into()
        ),
    }
}
