use std::collections::HashSet;

use indoc::indoc;

use crate::analysis::cfg::Cfg;
use crate::analysis::dom::DomInfo;
use crate::ir::{BlockId, Function, FunctionBuilder, InstRef};

fn build(json: &str) -> (Function, Cfg, DomInfo) {
    let func = serde_json::from_str(json).expect("parse function");
    let func = FunctionBuilder::new().build(func).expect("build");
    let cfg = Cfg::build(&func).expect("cfg");
    let dom = DomInfo::compute(&func, &cfg).expect("dom");
    (func, cfg, dom)
}

fn names(func: &Function, blocks: &[BlockId]) -> Vec<String> {
    blocks
        .iter()
        .map(|block| func.block(*block).name.clone())
        .collect()
}

// a:
//   br cond .b .c
// b: jmp .d
// c: jmp .d
// d: ret
const DIAMOND: &str = indoc! {r#"
    {"name": "main", "args": [{"name": "cond", "type": "bool"}], "instrs": [
      {"label": "a"},
      {"op": "br", "args": ["cond"], "labels": ["b", "c"]},
      {"label": "b"},
      {"op": "jmp", "labels": ["d"]},
      {"label": "c"},
      {"op": "jmp", "labels": ["d"]},
      {"label": "d"},
      {"op": "ret"}
    ]}
"#};

// a: x=0; jmp .h
// h: br cond .b .e
// b: x=x+1; jmp .h
// e: ret
const LOOP: &str = indoc! {r#"
    {"name": "main", "args": [{"name": "cond", "type": "bool"}], "instrs": [
      {"label": "a"},
      {"op": "const", "dest": "x", "type": "int", "value": 0},
      {"op": "jmp", "labels": ["h"]},
      {"label": "h"},
      {"op": "br", "args": ["cond"], "labels": ["b", "e"]},
      {"label": "b"},
      {"op": "const", "dest": "one", "type": "int", "value": 1},
      {"op": "add", "dest": "x", "type": "int", "args": ["x", "one"]},
      {"op": "jmp", "labels": ["h"]},
      {"label": "e"},
      {"op": "ret", "args": ["x"]}
    ]}
"#};

#[test]
fn diamond_dominator_sets() {
    let (func, _cfg, dom) = build(DIAMOND);
    let at = |name: &str| func.block_by_name(name).unwrap();

    assert_eq!(names(&func, dom.dom(at("a"))), ["a"]);
    assert_eq!(names(&func, dom.dom(at("b"))), ["a", "b"]);
    assert_eq!(names(&func, dom.dom(at("c"))), ["a", "c"]);
    // The join is dominated only by the entry, not by either arm.
    assert_eq!(names(&func, dom.dom(at("d"))), ["a", "d"]);
}

#[test]
fn diamond_idoms_and_tree() {
    let (func, _cfg, dom) = build(DIAMOND);
    let at = |name: &str| func.block_by_name(name).unwrap();

    assert_eq!(dom.idom(at("a")), None);
    assert_eq!(dom.idom(at("b")), Some(at("a")));
    assert_eq!(dom.idom(at("c")), Some(at("a")));
    assert_eq!(dom.idom(at("d")), Some(at("a")));
    assert_eq!(names(&func, dom.children(at("a"))), ["b", "c", "d"]);
    assert!(dom.children(at("b")).is_empty());
}

#[test]
fn diamond_frontiers() {
    let (func, _cfg, dom) = build(DIAMOND);
    let at = |name: &str| func.block_by_name(name).unwrap();

    assert!(dom.frontier(at("a")).is_empty());
    assert_eq!(names(&func, dom.frontier(at("b"))), ["d"]);
    assert_eq!(names(&func, dom.frontier(at("c"))), ["d"]);
    assert!(dom.frontier(at("d")).is_empty());
}

#[test]
fn loop_frontiers_include_the_header() {
    let (func, _cfg, dom) = build(LOOP);
    let at = |name: &str| func.block_by_name(name).unwrap();

    assert_eq!(names(&func, dom.frontier(at("b"))), ["h"]);
    assert_eq!(names(&func, dom.frontier(at("h"))), ["h"]);
    assert_eq!(dom.idom(at("h")), Some(at("a")));
    assert_eq!(dom.idom(at("b")), Some(at("h")));
    assert_eq!(dom.idom(at("e")), Some(at("h")));
    assert_eq!(names(&func, dom.children(at("h"))), ["b", "e"]);
}

#[test]
fn dominator_sets_are_a_fixpoint() {
    for source in [DIAMOND, LOOP] {
        let (func, cfg, dom) = build(source);
        for &block in cfg.blocks() {
            if block == cfg.entry() || cfg.preds(block).is_empty() {
                continue;
            }
            let mut expected: Option<HashSet<BlockId>> = None;
            for &pred in cfg.preds(block) {
                let pred_dom: HashSet<BlockId> = dom.dom(pred).iter().copied().collect();
                expected = Some(match expected {
                    Some(acc) => acc.intersection(&pred_dom).copied().collect(),
                    None => pred_dom,
                });
            }
            let mut expected = expected.unwrap();
            expected.insert(block);
            let actual: HashSet<BlockId> = dom.dom(block).iter().copied().collect();
            assert_eq!(actual, expected, "{}", func.block(block).name);
        }
    }
}

#[test]
fn idom_is_unique_and_strict() {
    for source in [DIAMOND, LOOP] {
        let (func, cfg, dom) = build(source);
        for &block in cfg.blocks() {
            if block == cfg.entry() {
                assert_eq!(dom.idom(block), None);
                continue;
            }
            let idom = dom
                .idom(block)
                .unwrap_or_else(|| panic!("no idom for {}", func.block(block).name));
            assert_ne!(idom, block);
            assert!(dom.dom(block).contains(&idom));
        }
    }
}

#[test]
fn frontier_matches_its_definition() {
    // y ∈ df[x] iff x dominates some predecessor of y without strictly
    // dominating y.
    for source in [DIAMOND, LOOP] {
        let (_func, cfg, dom) = build(source);
        for &x in cfg.blocks() {
            for &y in cfg.blocks() {
                let dominates_a_pred = cfg
                    .preds(y)
                    .iter()
                    .any(|&pred| dom.dominates_block(x, pred));
                let expected = dominates_a_pred && !dom.strictly_dominates_block(x, y);
                assert_eq!(dom.frontier(x).contains(&y), expected);
            }
        }
    }
}

#[test]
fn instruction_dominance_within_a_block_is_order() {
    let (func, _cfg, dom) = build(LOOP);
    let a = func.block_by_name("a").unwrap();
    let first = InstRef { block: a, idx: 0 };
    let second = InstRef { block: a, idx: 1 };

    assert!(dom.dominates_inst(first, second));
    assert!(!dom.dominates_inst(second, first));
    assert!(!dom.dominates_inst(first, first));
}

#[test]
fn instruction_dominance_crosses_blocks_transitively() {
    // a → b → c in a straight chain: a's instructions dominate c's even
    // though c is two levels down the dominator tree.
    let (func, _cfg, dom) = build(indoc! {r#"
        {"name": "main", "instrs": [
          {"label": "a"},
          {"op": "const", "dest": "x", "type": "int", "value": 1},
          {"op": "jmp", "labels": ["b"]},
          {"label": "b"},
          {"op": "jmp", "labels": ["c"]},
          {"label": "c"},
          {"op": "ret"}
        ]}
    "#});
    let at = |name: &str| func.block_by_name(name).unwrap();

    assert_eq!(dom.children(at("a")), &[at("b")]);
    let def = InstRef {
        block: at("a"),
        idx: 0,
    };
    let use_site = InstRef {
        block: at("c"),
        idx: 0,
    };
    assert!(dom.dominates_inst(def, use_site));
    assert!(!dom.dominates_inst(use_site, def));
}

#[test]
fn unreachable_block_dominates_only_itself() {
    let (func, _cfg, dom) = build(indoc! {r#"
        {"name": "main", "instrs": [
          {"label": "a"},
          {"op": "ret"},
          {"label": "orphan"},
          {"op": "ret"}
        ]}
    "#});
    let orphan = func.block_by_name("orphan").unwrap();

    assert_eq!(names(&func, dom.dom(orphan)), ["orphan"]);
    assert_eq!(dom.idom(orphan), None);
}
