//! # Error Handling for the PEG VM
//!
//! This module defines the two error kinds that cross the core boundary:
//! [`LoadError`], produced while decoding a bytecode file, and
//! [`FatalRuntimeError`], produced while executing a loaded program.
//!
//! Neither represents PEG parse failure — a grammar not matching its input
//! is a normal, first-class outcome of `execute` (`Ok(0)`), not an error.
//! These two types only ever surface when the bytecode or the VM's own
//! invariants are violated.

use std::fmt;
use std::io;

/// Errors produced while decoding a bytecode file into an instruction
/// array and constant pools.
///
/// The loader validates rather than guesses: any field outside its
/// declared range, and any displacement that would resolve outside the
/// instruction array, produces one of these instead of panicking or
/// silently truncating.
#[derive(Debug)]
pub enum LoadError {
    /// Could not read the bytecode file from disk.
    Io(io::Error),
    /// The 3-byte magic at the start of the file did not match.
    BadMagic([u8; 3]),
    /// A reserved field that must be zero was non-zero.
    ReservedFieldNonZero(&'static str),
    /// A pool entry or the instruction stream declared a length that runs
    /// past the end of the file.
    UnexpectedEof { wanted: usize, remaining: usize },
    /// An opcode byte (after stripping the legacy has-jump bit) did not
    /// match any known opcode, direct or legacy-remapped.
    UnknownOpcode(u8),
    /// The legacy has-jump bit was set on an opcode. The modern encoder
    /// never sets this bit; seeing it set means the file is stale or
    /// corrupt, so the loader rejects it rather than guessing at intent.
    LegacyHasJumpBit { instruction_index: usize, opcode: u8 },
    /// A branch displacement resolved to an instruction index outside
    /// `[0, instruction_count + 2)`.
    BranchOutOfRange { target: usize, instruction_count: usize },
    /// A pool index referenced by an instruction is out of bounds for the
    /// pool it names.
    PoolIndexOutOfRange { pool: &'static str, index: usize, len: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read bytecode file: {}", e),
            LoadError::BadMagic(got) => {
                write!(f, "bad magic bytes: {:?} (expected a recognized file type tag)", got)
            }
            LoadError::ReservedFieldNonZero(field) => {
                write!(f, "reserved field '{}' must be zero", field)
            }
            LoadError::UnexpectedEof { wanted, remaining } => write!(
                f,
                "unexpected end of file: wanted {} more byte(s), {} remaining",
                wanted, remaining
            ),
            LoadError::UnknownOpcode(op) => write!(f, "unknown opcode byte: {}", op),
            LoadError::LegacyHasJumpBit { instruction_index, opcode } => write!(
                f,
                "instruction {} (opcode {}) sets the legacy has-jump bit, which this loader rejects",
                instruction_index, opcode
            ),
            LoadError::BranchOutOfRange { target, instruction_count } => write!(
                f,
                "branch target {} is out of range for {} instruction(s)",
                target, instruction_count
            ),
            LoadError::PoolIndexOutOfRange { pool, index, len } => write!(
                f,
                "{} pool index {} out of range (pool has {} entries)",
                pool, index, len
            ),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}

/// Errors surfaced by the execution engine that are not ordinary PEG
/// match failure.
///
/// These indicate either a resource limit was hit (stack overflow) or a
/// VM invariant was violated that the loader should have prevented (an
/// out-of-range pool index reached at run time). The latter should be
/// unreachable for bytecode that passed loading; it is checked anyway
/// because trusting an already-validated index in the hot loop is cheap
/// insurance, not a performance cost worth arguing about.
#[derive(Debug, PartialEq, Eq)]
pub enum FatalRuntimeError {
    /// The backtracking stack grew past its fixed capacity.
    StackOverflow { capacity: usize },
    /// An instruction referenced a pool index that is invalid for the
    /// loaded program (should be impossible if the loader validated).
    InvalidPoolIndex { pool: &'static str, index: usize },
    /// `Ret`/`Back` executed with no matching call/position frame on the
    /// stack. Indicates a malformed program (unbalanced `Call`/`Pos`)
    /// that the loader cannot detect ahead of time.
    StackShapeMismatch { expected: &'static str },
}

impl fmt::Display for FatalRuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalRuntimeError::StackOverflow { capacity } => {
                write!(f, "backtracking stack overflow (capacity {})", capacity)
            }
            FatalRuntimeError::InvalidPoolIndex { pool, index } => {
                write!(f, "invalid {} pool index {} at run time", pool, index)
            }
            FatalRuntimeError::StackShapeMismatch { expected } => {
                write!(f, "stack shape mismatch: expected a {} frame", expected)
            }
        }
    }
}

impl std::error::Error for FatalRuntimeError {}
