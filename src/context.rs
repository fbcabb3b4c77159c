//! # Execution Context
//!
//! [`Context`] owns everything one match needs: the input bytes, the
//! current input position, the backtracking stack, and the three constant
//! pools populated by the loader. A `Context` is created before loading,
//! handed to [`crate::bytecode::load_bytecode`] to be populated, then
//! consumed by exactly one [`crate::vm::execute`] call.

use std::fs;
use std::io;
use std::path::Path;

use crate::bitset::Bitset;

/// Default backtracking stack depth.
pub const DEFAULT_STACK_CAPACITY: usize = 1024;

/// Owns the input buffer, backtracking stack, and constant pools for one
/// PEG match.
///
/// Only one execution may run against a `Context` at a time; the type
/// does not enforce this beyond the natural borrowing rules of
/// `&mut Context` in [`crate::vm::execute`].
pub struct Context {
    /// Input bytes, with a single trailing NUL sentinel appended so `Any`
    /// can detect end-of-input without a separate bounds check.
    pub(crate) input: Vec<u8>,
    /// Length of the real input, excluding the trailing sentinel byte.
    pub(crate) input_size: usize,
    /// Current input offset. Valid range is `0..=input_size` at every
    /// instruction boundary.
    pub(crate) pos: usize,
    /// Fixed-capacity backtracking stack.
    pub(crate) stack: Vec<crate::vm::Slot>,
    /// Capacity the stack was created with; overflow beyond this is fatal.
    pub(crate) stack_capacity: usize,
    /// Interned non-terminal names, used only by `Label` for diagnostics.
    pub names: Vec<Vec<u8>>,
    /// Character-class bitsets referenced by `Set`/`OSet`/`RSet`.
    pub sets: Vec<Bitset>,
    /// Literal strings referenced by `Str`/`NStr`/`OStr`.
    pub strings: Vec<Vec<u8>>,
}

impl Context {
    /// Load `path` into memory and build an empty `Context` ready for
    /// [`crate::bytecode::load_bytecode`], using the default stack
    /// capacity.
    pub fn from_input_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::with_stack_capacity(path, DEFAULT_STACK_CAPACITY)
    }

    /// Like [`Context::from_input_file`], but with an explicit
    /// backtracking stack capacity. The stack does not grow dynamically;
    /// callers who expect deep grammars can ask for more room up front
    /// instead.
    pub fn with_stack_capacity(path: impl AsRef<Path>, stack_capacity: usize) -> io::Result<Self> {
        let mut input = fs::read(path)?;
        let input_size = input.len();
        input.push(0);
        Ok(Context {
            input,
            input_size,
            pos: 0,
            stack: Vec::with_capacity(stack_capacity),
            stack_capacity,
            names: Vec::new(),
            sets: Vec::new(),
            strings: Vec::new(),
        })
    }

    /// Build a `Context` directly from an in-memory input buffer, mainly
    /// for tests that want to avoid touching the filesystem.
    pub fn from_bytes(mut input: Vec<u8>) -> Self {
        let input_size = input.len();
        input.push(0);
        Context {
            input,
            input_size,
            pos: 0,
            stack: Vec::with_capacity(DEFAULT_STACK_CAPACITY),
            stack_capacity: DEFAULT_STACK_CAPACITY,
            names: Vec::new(),
            sets: Vec::new(),
            strings: Vec::new(),
        }
    }

    /// Number of bytes of real input (excluding the NUL sentinel).
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Current input offset, updated by `execute` as it runs and left at
    /// the consumed-prefix length once execution returns.
    pub fn pos(&self) -> usize {
        self.pos
    }
}
