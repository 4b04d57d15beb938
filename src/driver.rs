//! Function-at-a-time pipeline driver.

use std::io::Write;
use std::path::PathBuf;

use crate::analysis::{Cfg, DomInfo};
use crate::bril;
use crate::diag::Error;
use crate::ir::{format_function, FunctionBuilder};
use crate::opt::PassManager;
use crate::ssa;

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Comma-separated dump spec, as given on the command line.
    pub dump: Option<String>,
    /// Directory for per-function `.dot` graphs.
    pub dot: Option<PathBuf>,
    /// Check SSA invariants after conversion.
    pub verify: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct DumpFlags {
    blocks: bool,
    cfg: bool,
    dom: bool,
    ssa: bool,
    ir: bool,
}

impl DumpFlags {
    fn from_spec(spec: Option<&str>) -> Self {
        let mut flags = Self::default();
        if let Some(spec) = spec {
            for item in spec.split(',').map(|item| item.trim().to_lowercase()) {
                match item.as_str() {
                    "blocks" => flags.blocks = true,
                    "cfg" => flags.cfg = true,
                    "dom" => flags.dom = true,
                    "ssa" => flags.ssa = true,
                    "ir" => flags.ir = true,
                    "" => {}
                    _ => eprintln!("[WARN] unknown dump flag: {item}"),
                }
            }
        }
        flags
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOutcome {
    /// Functions written to the output.
    pub emitted: usize,
    /// Functions dropped as malformed.
    pub aborted: usize,
}

/// Runs every function through the pipeline, writing one
/// `{"functions":[..]}` document per function, one line each.
pub fn run_program(
    program: bril::Program,
    opts: &Options,
    out: &mut impl Write,
) -> Result<RunOutcome, Error> {
    let dump = DumpFlags::from_spec(opts.dump.as_deref());
    let mut outcome = RunOutcome::default();

    for func in program.functions {
        let name = func.name.clone();
        match run_function(func, &dump, opts) {
            Ok(func) => {
                let doc = bril::Program {
                    functions: vec![func],
                };
                // A failed write to the output stream is an IO problem, not
                // the function's fault.
                serde_json::to_writer(&mut *out, &doc).map_err(std::io::Error::from)?;
                writeln!(out)?;
                outcome.emitted += 1;
            }
            Err(error) if error.is_malformed() => {
                eprintln!("[ERROR] function `{name}`: {error}");
                outcome.aborted += 1;
            }
            Err(error) => return Err(error),
        }
    }

    Ok(outcome)
}

fn run_function(
    func: bril::Function,
    dump: &DumpFlags,
    opts: &Options,
) -> Result<bril::Function, Error> {
    let mut func = FunctionBuilder::new().build(func)?;
    if func.blocks.is_empty() {
        return Ok(func.to_bril());
    }
    if dump.blocks {
        eprint!("{}", format_function(&func));
    }

    let cfg = Cfg::build(&func)?;
    if let Some(dir) = &opts.dot {
        cfg.write_dot(&func, dir)?;
    }
    if dump.cfg {
        eprint!("{}", cfg.format(&func));
    }

    let dom = DomInfo::compute(&func, &cfg)?;
    if dump.dom {
        eprint!("{}", dom.format(&func));
    }

    ssa::to_ssa(&mut func, &cfg, &dom);
    if opts.verify {
        ssa::verify::verify_function(&func, &dom)?;
    }
    if dump.ssa {
        eprint!("{}", format_function(&func));
    }

    PassManager::new().run(&mut func)?;
    if dump.ir {
        eprint!("{}", format_function(&func));
    }

    Ok(func.to_bril())
}

#[cfg(test)]
#[path = "tests/t_driver.rs"]
mod tests;
