//! # Threaded-Dispatch Execution Engine
//!
//! This module implements the interpreter that runs a decoded [`Program`]
//! against a [`Context`]'s input, deciding PEG recognition. Ordered
//! choice, backtracking, and the zero-progress guard on repetition
//! (`Skip`) are all expressed through one explicit backtracking stack and
//! a single "current failure frame" pointer.
//!
//! ## Dispatch
//! Rust has no portable computed-goto, so a `match` over [`Op`] inside
//! the fetch loop stands in for indirect-threaded dispatch. The loop
//! avoids re-validating anything the loader already checked; each opcode
//! does exactly the one bounds check its semantics require.
//!
//! ## The backtracking stack
//! A flat untyped slot array with failure frames linked by raw pointer
//! would let `fail` truncate in O(1), at the cost of no static guarantee
//! that a slot holds the shape its opcode expects. Here the stack is a
//! `Vec<Slot>`, a tagged enum, and the failure chain is a chain of
//! indices into that same vector — the slot `current_fail` names is
//! always a `Slot::Failure`.


use std::env;

use once_cell::sync::Lazy;

use crate::bytecode::{Op, Program};
use crate::context::Context;
use crate::error::FatalRuntimeError;

/// One entry on the backtracking stack.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Slot {
    /// A return program-counter pushed by `Call`, consumed by `Ret`.
    Call(usize),
    /// A saved input offset pushed by `Pos`, consumed by `Back`.
    Position(usize),
    /// A saved alternative: restore `pos`, resume at `resume`, and make
    /// `prev` (an index into the same stack) the new current failure
    /// frame.
    Failure { pos: usize, resume: usize, prev: usize },
}

/// Human-readable opcode names, used only for the optional trace output
/// below — purely diagnostic.
fn opcode_name(op: &Op) -> &'static str {
    match op {
        Op::Nop => "Nop",
        Op::Exit(_) => "Exit",
        Op::Fail => "Fail",
        Op::Alt(_) => "Alt",
        Op::Succ => "Succ",
        Op::Jump(_) => "Jump",
        Op::Call { .. } => "Call",
        Op::Ret => "Ret",
        Op::Pos => "Pos",
        Op::Back => "Back",
        Op::Skip(_) => "Skip",
        Op::Byte(_) => "Byte",
        Op::NByte(_) => "NByte",
        Op::Any => "Any",
        Op::Str(_) => "Str",
        Op::NStr(_) => "NStr",
        Op::OStr(_) => "OStr",
        Op::Set(_) => "Set",
        Op::OSet(_) => "OSet",
        Op::RSet(_) => "RSet",
        Op::Label(_) => "Label",
    }
}

/// Whether per-instruction tracing is enabled, checked once before the
/// dispatch loop starts rather than on every step, so the hot loop pays
/// nothing when tracing is off.
static TRACE_ENABLED: Lazy<bool> =
    Lazy::new(|| env::var("PEGVM_TRACE").map(|v| v == "1").unwrap_or(false));

/// Run `program` against `ctx`'s input.
///
/// Returns `Ok(0)` if the start rule failed to match, `Ok(1)` if it
/// matched; `ctx.pos()` holds the number of input bytes consumed either
/// way. Returns `Err` only for a VM-level fault (stack overflow, or a
/// malformed program reaching `Ret`/`Back` with no matching frame) —
/// ordinary PEG failure is not an error.
pub fn execute(ctx: &mut Context, program: &Program) -> Result<i64, FatalRuntimeError> {
    let capacity = ctx.stack_capacity;
    ctx.stack.clear();

    // Sentinel failure frame: resumes at the synthetic Exit(0), and is
    // its own predecessor.
    ctx.stack.push(Slot::Failure { pos: 0, resume: 0, prev: 0 });
    let mut current_fail: usize = 0;

    // The start rule returns to the synthetic Exit(1).
    ctx.stack.push(Slot::Call(1));

    let mut pc: usize = 2;
    let mut pos: usize = 0;

    macro_rules! fail {
        () => {{
            let (f_pos, f_resume, f_prev) = match ctx.stack[current_fail] {
                Slot::Failure { pos, resume, prev } => (pos, resume, prev),
                _ => unreachable!("current_fail always names a Failure slot"),
            };
            pos = f_pos;
            pc = f_resume;
            ctx.stack.truncate(current_fail);
            current_fail = f_prev;
            continue;
        }};
    }

    loop {
        if *TRACE_ENABLED {
            eprintln!("[{}] {} (pos:{})", pc, opcode_name(&program[pc]), pos);
        }

        match program[pc] {
            Op::Nop => pc += 1,

            Op::Exit(code) => {
                ctx.pos = pos;
                return Ok(code as i64);
            }

            Op::Fail => fail!(),

            Op::Alt(target) => {
                if ctx.stack.len() >= capacity {
                    return Err(FatalRuntimeError::StackOverflow { capacity });
                }
                ctx.stack.push(Slot::Failure { pos, resume: target, prev: current_fail });
                current_fail = ctx.stack.len() - 1;
                pc += 1;
            }

            Op::Succ => {
                let prev = match ctx.stack[current_fail] {
                    Slot::Failure { prev, .. } => prev,
                    _ => unreachable!("current_fail always names a Failure slot"),
                };
                ctx.stack.truncate(current_fail);
                current_fail = prev;
                pc += 1;
            }

            Op::Jump(target) => pc = target,

            Op::Call { target, .. } => {
                if ctx.stack.len() >= capacity {
                    return Err(FatalRuntimeError::StackOverflow { capacity });
                }
                ctx.stack.push(Slot::Call(pc + 1));
                pc = target;
            }

            Op::Ret => {
                match ctx.stack.pop() {
                    Some(Slot::Call(return_pc)) => pc = return_pc,
                    _ => {
                        return Err(FatalRuntimeError::StackShapeMismatch { expected: "call" })
                    }
                }
            }

            Op::Pos => {
                if ctx.stack.len() >= capacity {
                    return Err(FatalRuntimeError::StackOverflow { capacity });
                }
                ctx.stack.push(Slot::Position(pos));
                pc += 1;
            }

            Op::Back => match ctx.stack.pop() {
                Some(Slot::Position(saved)) => {
                    pos = saved;
                    pc += 1;
                }
                _ => return Err(FatalRuntimeError::StackShapeMismatch { expected: "position" }),
            },

            Op::Skip(target) => {
                let guard_pos = match ctx.stack[current_fail] {
                    Slot::Failure { pos, .. } => pos,
                    _ => unreachable!("current_fail always names a Failure slot"),
                };
                if pos == guard_pos {
                    fail!();
                }
                if let Slot::Failure { pos: p, .. } = &mut ctx.stack[current_fail] {
                    *p = pos;
                }
                pc = target;
            }

            Op::Byte(b) => {
                if ctx.input[pos] == b {
                    pos += 1;
                    pc += 1;
                } else {
                    fail!();
                }
            }

            Op::NByte(b) => {
                if ctx.input[pos] != b {
                    pc += 1;
                } else {
                    fail!();
                }
            }

            Op::Any => {
                if ctx.input[pos] != 0 {
                    pos += 1;
                    pc += 1;
                } else {
                    fail!();
                }
            }

            Op::Str(idx) => {
                let s = pool_get(&ctx.strings, idx, "string")?;
                if starts_with_at(&ctx.input, pos, s) {
                    pos += s.len();
                    pc += 1;
                } else {
                    fail!();
                }
            }

            Op::NStr(idx) => {
                let s = pool_get(&ctx.strings, idx, "string")?;
                if starts_with_at(&ctx.input, pos, s) {
                    fail!();
                } else {
                    pc += 1;
                }
            }

            Op::OStr(idx) => {
                let s = pool_get(&ctx.strings, idx, "string")?;
                if starts_with_at(&ctx.input, pos, s) {
                    pos += s.len();
                }
                pc += 1;
            }

            Op::Set(idx) => {
                let set = pool_get(&ctx.sets, idx, "set")?;
                if set.get(ctx.input[pos]) {
                    pos += 1;
                    pc += 1;
                } else {
                    fail!();
                }
            }

            Op::OSet(idx) => {
                let set = pool_get(&ctx.sets, idx, "set")?;
                if set.get(ctx.input[pos]) {
                    pos += 1;
                }
                pc += 1;
            }

            Op::RSet(idx) => {
                let set = pool_get(&ctx.sets, idx, "set")?;
                while set.get(ctx.input[pos]) {
                    pos += 1;
                }
                pc += 1;
            }

            Op::Label(idx) => {
                if *TRACE_ENABLED {
                    if let Some(name) = ctx.names.get(idx as usize) {
                        eprintln!("{}", String::from_utf8_lossy(name));
                    }
                }
                pc += 1;
            }
        }
    }
}

/// Bounds-checked pool lookup. The loader already validates every pool
/// index it decodes, so this should never fail for a program it
/// produced; it exists to turn a corrupted in-memory `Program` into a
/// reported fault instead of a panic.
fn pool_get<'a, T>(pool: &'a [T], idx: u16, name: &'static str) -> Result<&'a T, FatalRuntimeError> {
    pool.get(idx as usize)
        .ok_or(FatalRuntimeError::InvalidPoolIndex { pool: name, index: idx as usize })
}

fn starts_with_at(input: &[u8], pos: usize, needle: &[u8]) -> bool {
    input[pos..].starts_with(needle)
}
