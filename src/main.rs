use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use brilopt::bril;
use brilopt::driver::{self, Options};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Bril JSON file; reads stdin when omitted
    input: Option<PathBuf>,

    /// Comma-separated list of things to dump to stderr: blocks,cfg,dom,ssa,ir
    #[clap(long)]
    dump: Option<String>,

    /// Directory to write per-function .dot graphs into
    #[clap(long)]
    dot: Option<PathBuf>,

    /// Check SSA invariants after conversion
    #[clap(long)]
    verify: bool,
}

fn usage() {
    eprintln!("usage: bril2json < test.bril | brilopt");
    eprintln!("       brilopt test.json");
}

fn main() -> ExitCode {
    let args = Args::parse();

    let text = match &args.input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                eprintln!("[ERROR] failed to read {}: {error}", path.display());
                usage();
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(error) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("[ERROR] failed to read stdin: {error}");
                usage();
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    let program: bril::Program = match serde_json::from_str(&text) {
        Ok(program) => program,
        Err(error) => {
            eprintln!("[ERROR] invalid Bril JSON: {error}");
            return ExitCode::FAILURE;
        }
    };

    let opts = Options {
        dump: args.dump,
        dot: args.dot,
        verify: args.verify,
    };

    let stdout = std::io::stdout();
    match driver::run_program(program, &opts, &mut stdout.lock()) {
        Ok(outcome) if outcome.aborted == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("[ERROR] {error}");
            ExitCode::FAILURE
        }
    }
}
