//! Plain-text rendering of built functions, for dumps and tests.

use std::fmt::Write;

use serde_json::Value;

use crate::bril;
use crate::ir::function::Function;

pub fn format_function(func: &Function) -> String {
    let mut out = String::new();
    write!(out, "@{}", func.name).unwrap();
    if !func.params.is_empty() {
        let params: Vec<String> = func
            .params
            .iter()
            .map(|param| match &param.ty {
                Some(ty) => format!("{}: {}", param.name, format_type(ty)),
                None => param.name.clone(),
            })
            .collect();
        write!(out, "({})", params.join(", ")).unwrap();
    }
    out.push_str(" {\n");
    for block in &func.blocks {
        writeln!(out, ".{}:", block.name).unwrap();
        for inst in &block.insts {
            writeln!(out, "  {}", format_inst(inst)).unwrap();
        }
    }
    out.push_str("}\n");
    out
}

pub fn format_inst(inst: &bril::Instruction) -> String {
    let mut line = String::new();
    if let Some(dest) = &inst.dest {
        line.push_str(dest);
        if let Some(ty) = &inst.ty {
            write!(line, ": {}", format_type(ty)).unwrap();
        }
        line.push_str(" = ");
    }
    line.push_str(&inst.op);
    if let Some(value) = inst.extra.get("value") {
        write!(line, " {value}").unwrap();
    }
    for arg in inst.args() {
        write!(line, " {arg}").unwrap();
    }
    for label in inst.labels() {
        write!(line, " .{label}").unwrap();
    }
    line.push(';');
    line
}

fn format_type(ty: &Value) -> String {
    match ty {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
