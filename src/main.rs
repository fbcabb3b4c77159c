//! PEG bytecode VM — command-line front end.
//!
//! This binary is a thin collaborator over the core library: it has no
//! grammar compiler and no statistics/timing output. It loads a bytecode
//! file, loads an input file, runs the match, and maps the result to a
//! process exit code.
//!
//! Behavior summary:
//! - With **no args**, print usage and exit non-zero.
//! - With `-h/--help`, print usage and exit 0.
//! - With `-v/--version`, print the version string and exit 0.
//! - With `<bytecode> <input>`, load and execute; exit 0 only if the start
//!   rule matched *and* consumed the entire input.
//!
//! An optional third argument overrides the backtracking stack capacity,
//! exposed here as an opt-in rather than a default.

use std::env;
use std::process::ExitCode;

use pegvm::{load_bytecode, Context};

/// CLI wrapper version. Reflects this front end, not the bytecode format.
const VERSION: &str = "0.1.0";

/// Construct the help/usage text shown for `-h/--help`.
fn usage() -> String {
    format!(
        r#"pegvm v{0}

Usage:
    pegvm <bytecode.bin> <input> [stack-capacity]

Arguments:
    <bytecode.bin>
        Path to a compiled PEG bytecode file.
    <input>
        Path to the byte input to match against.
    [stack-capacity]
        Optional override for the backtracking stack depth (default 1024).

Exit status:
    0   the start rule matched and consumed the entire input
    1   the start rule did not match, or left a tail unconsumed
    2   the bytecode or input file could not be loaded
    3   a fatal VM error occurred (stack overflow, corrupt program)

Options:
    -h, --help
        Show this help message and exit.
    -v, --version
        Show the CLI version."#,
        VERSION
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        eprintln!("{}", usage());
        return ExitCode::from(1);
    }

    if args[1] == "-h" || args[1] == "--help" {
        println!("{}", usage());
        return ExitCode::SUCCESS;
    }

    if args[1] == "-v" || args[1] == "--version" {
        println!("pegvm v{}", VERSION);
        return ExitCode::SUCCESS;
    }

    if args.len() < 3 {
        eprintln!("pegvm: missing <input> argument\n");
        eprintln!("{}", usage());
        return ExitCode::from(1);
    }

    let bytecode_path = &args[1];
    let input_path = &args[2];
    let stack_capacity = match args.get(3) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => {
                eprintln!("pegvm: invalid stack-capacity '{}'", raw);
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    let loaded = match stack_capacity {
        Some(capacity) => Context::with_stack_capacity(input_path, capacity),
        None => Context::from_input_file(input_path),
    };
    let mut ctx = match loaded {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("pegvm: failed to read input '{}': {}", input_path, e);
            return ExitCode::from(2);
        }
    };

    let program = match load_bytecode(&mut ctx, bytecode_path, "") {
        Ok(program) => program,
        Err(e) => {
            eprintln!("pegvm: failed to load bytecode '{}': {}", bytecode_path, e);
            return ExitCode::from(2);
        }
    };

    match pegvm::execute(&mut ctx, &program) {
        Ok(1) if ctx.pos() == ctx.input_size() => ExitCode::SUCCESS,
        Ok(1) => {
            eprintln!(
                "pegvm: matched but left {} byte(s) unconsumed",
                ctx.input_size() - ctx.pos()
            );
            ExitCode::from(1)
        }
        Ok(_) => {
            eprintln!("pegvm: no match");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("pegvm: {}", e);
            ExitCode::from(3)
        }
    }
}
