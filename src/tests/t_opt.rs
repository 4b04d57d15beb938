use indoc::indoc;

use crate::ir::{Function, FunctionBuilder};
use crate::opt::{copy_prop::CopyProp, cse::CommonSubexprElim, dce::DeadInstElim, Pass, PassManager};

fn build(json: &str) -> Function {
    let func = serde_json::from_str(json).expect("parse function");
    FunctionBuilder::new().build(func).expect("build")
}

fn ops(func: &Function) -> Vec<String> {
    func.blocks
        .iter()
        .flat_map(|block| block.insts.iter())
        .map(|inst| inst.op.clone())
        .collect()
}

const TWO_ADDS: &str = indoc! {r#"
    {"name": "main",
     "args": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
     "instrs": [
      {"op": "add", "dest": "z1", "type": "int", "args": ["a", "b"]},
      {"op": "add", "dest": "z2", "type": "int", "args": ["a", "b"]},
      {"op": "print", "args": ["z1"]},
      {"op": "print", "args": ["z2"]},
      {"op": "ret"}
    ]}
"#};

#[test]
fn cse_rewrites_the_later_twin_in_a_block() {
    let mut func = build(TWO_ADDS);
    let changed = CommonSubexprElim.run(&mut func).expect("cse");
    assert!(changed);

    let second = &func.blocks[0].insts[1];
    assert_eq!(second.op, "id");
    assert_eq!(second.args(), ["z1"]);
    assert_eq!(second.dest.as_deref(), Some("z2"));
    // The dominating twin is untouched.
    assert_eq!(func.blocks[0].insts[0].op, "add");
}

#[test]
fn cse_rewrites_across_dominating_blocks() {
    let mut func = build(indoc! {r#"
        {"name": "main",
         "args": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
         "instrs": [
          {"label": "top"},
          {"op": "add", "dest": "z1", "type": "int", "args": ["a", "b"]},
          {"op": "jmp", "labels": ["down"]},
          {"label": "down"},
          {"op": "add", "dest": "z2", "type": "int", "args": ["a", "b"]},
          {"op": "print", "args": ["z2"]},
          {"op": "ret"}
        ]}
    "#});
    CommonSubexprElim.run(&mut func).expect("cse");

    let down = func.block_by_name("down").unwrap();
    let inst = &func.block(down).insts[0];
    assert_eq!(inst.op, "id");
    assert_eq!(inst.args(), ["z1"]);
}

#[test]
fn cse_leaves_siblings_alone() {
    // The twins sit in sibling branch arms; neither dominates the other.
    let mut func = build(indoc! {r#"
        {"name": "main",
         "args": [{"name": "cond", "type": "bool"},
                  {"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
         "instrs": [
          {"label": "top"},
          {"op": "br", "args": ["cond"], "labels": ["left", "right"]},
          {"label": "left"},
          {"op": "add", "dest": "z1", "type": "int", "args": ["a", "b"]},
          {"op": "jmp", "labels": ["join"]},
          {"label": "right"},
          {"op": "add", "dest": "z2", "type": "int", "args": ["a", "b"]},
          {"op": "jmp", "labels": ["join"]},
          {"label": "join"},
          {"op": "ret"}
        ]}
    "#});
    let changed = CommonSubexprElim.run(&mut func).expect("cse");

    assert!(!changed);
    assert_eq!(ops(&func), ["br", "add", "jmp", "add", "jmp", "ret"]);
}

#[test]
fn cse_treats_add_as_commutative() {
    let mut func = build(indoc! {r#"
        {"name": "main",
         "args": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
         "instrs": [
          {"op": "add", "dest": "z1", "type": "int", "args": ["a", "b"]},
          {"op": "add", "dest": "z2", "type": "int", "args": ["b", "a"]},
          {"op": "print", "args": ["z2"]},
          {"op": "ret"}
        ]}
    "#});
    CommonSubexprElim.run(&mut func).expect("cse");

    assert_eq!(func.blocks[0].insts[1].op, "id");
}

#[test]
fn cse_keeps_operand_order_for_noncommutative_ops() {
    let mut func = build(indoc! {r#"
        {"name": "main",
         "args": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
         "instrs": [
          {"op": "sub", "dest": "z1", "type": "int", "args": ["a", "b"]},
          {"op": "sub", "dest": "z2", "type": "int", "args": ["b", "a"]},
          {"op": "print", "args": ["z2"]},
          {"op": "ret"}
        ]}
    "#});
    let changed = CommonSubexprElim.run(&mut func).expect("cse");

    assert!(!changed);
}

#[test]
fn cse_never_merges_side_effecting_ops() {
    let mut func = build(indoc! {r#"
        {"name": "main", "args": [{"name": "a", "type": "int"}], "instrs": [
          {"op": "call", "dest": "r1", "type": "int", "funcs": ["f"], "args": ["a"]},
          {"op": "call", "dest": "r2", "type": "int", "funcs": ["f"], "args": ["a"]},
          {"op": "print", "args": ["r1"]},
          {"op": "print", "args": ["r2"]},
          {"op": "ret"}
        ]}
    "#});
    let changed = CommonSubexprElim.run(&mut func).expect("cse");

    assert!(!changed);
    assert_eq!(ops(&func), ["call", "call", "print", "print", "ret"]);
}

#[test]
fn copy_prop_points_chained_copies_at_the_source() {
    let mut func = build(indoc! {r#"
        {"name": "main", "args": [{"name": "y", "type": "int"}], "instrs": [
          {"op": "id", "dest": "x", "type": "int", "args": ["y"]},
          {"op": "id", "dest": "z", "type": "int", "args": ["x"]},
          {"op": "add", "dest": "w", "type": "int", "args": ["z", "z"]},
          {"op": "ret"}
        ]}
    "#});
    let changed = CopyProp.run(&mut func).expect("copy-prop");
    assert!(changed);

    let insts = &func.blocks[0].insts;
    assert_eq!(insts[0].args(), ["y"]);
    // The second link reads the founding source, not the middle of the chain.
    assert_eq!(insts[1].args(), ["y"]);
    // Non-copy readers are left for later passes.
    assert_eq!(insts[2].args(), ["z", "z"]);
}

#[test]
fn die_drops_unused_definitions() {
    let mut func = build(indoc! {r#"
        {"name": "main", "instrs": [
          {"op": "const", "dest": "x", "type": "int", "value": 1},
          {"op": "const", "dest": "y", "type": "int", "value": 2},
          {"op": "print", "args": ["y"]},
          {"op": "ret"}
        ]}
    "#});
    let changed = DeadInstElim.run(&mut func).expect("die");
    assert!(changed);

    assert_eq!(ops(&func), ["const", "print", "ret"]);
    assert_eq!(func.blocks[0].insts[0].dest.as_deref(), Some("y"));
}

#[test]
fn die_pins_side_effecting_instructions() {
    let mut func = build(indoc! {r#"
        {"name": "main", "args": [{"name": "p", "type": "ptr"}], "instrs": [
          {"op": "call", "dest": "unused", "type": "int", "funcs": ["f"]},
          {"op": "const", "dest": "v", "type": "int", "value": 3},
          {"op": "store", "args": ["p", "v"]},
          {"op": "ret"}
        ]}
    "#});
    let changed = DeadInstElim.run(&mut func).expect("die");

    // The call keeps running for its effect; the store pins its operands'
    // producer too.
    assert!(!changed);
    assert_eq!(ops(&func), ["call", "const", "store", "ret"]);
}

#[test]
fn pass_pipeline_cleans_up_after_cse() {
    let mut func = build(TWO_ADDS);
    PassManager::new().run(&mut func).expect("passes");

    assert_eq!(ops(&func), ["add", "id", "print", "print", "ret"]);
    let insts = &func.blocks[0].insts;
    assert_eq!(insts[1].args(), ["z1"]);
    assert_eq!(insts[2].args(), ["z1"]);
    assert_eq!(insts[3].args(), ["z2"]);
}
