//! Intra-block copy propagation over `id` instructions.

use crate::ir::Function;
use crate::opt::{Pass, PassError};

pub struct CopyProp;

/// Names known to hold one value: `names[0]` is the founding source, the
/// rest are copy destinations, each defined by the `id` at the recorded
/// position.
struct CopyClass {
    names: Vec<String>,
    copies: Vec<usize>,
}

impl Pass for CopyProp {
    fn name(&self) -> &'static str {
        "copy-prop"
    }

    fn run(&mut self, func: &mut Function) -> Result<bool, PassError> {
        let mut changed = false;

        for block in &mut func.blocks {
            let mut classes: Vec<CopyClass> = Vec::new();
            for (idx, inst) in block.insts.iter().enumerate() {
                if inst.op != "id" {
                    continue;
                }
                let (Some(dest), Some(source)) = (&inst.dest, inst.args().first()) else {
                    continue;
                };
                match classes
                    .iter_mut()
                    .find(|class| class.names.contains(source))
                {
                    Some(class) => {
                        class.names.push(dest.clone());
                        class.copies.push(idx);
                    }
                    None => classes.push(CopyClass {
                        names: vec![source.clone(), dest.clone()],
                        copies: vec![idx],
                    }),
                }
            }

            for class in &classes {
                let canonical = &class.names[0];
                for &idx in &class.copies {
                    let inst = &mut block.insts[idx];
                    if inst.args() != std::slice::from_ref(canonical) {
                        inst.args = Some(vec![canonical.clone()]);
                        changed = true;
                    }
                }
            }
        }

        Ok(changed)
    }
}
