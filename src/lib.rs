//! A minimal virtual machine that executes compiled PEG bytecode against
//! byte-oriented input.
//!
//! The crate is split the way the format itself is: [`bitset`] and
//! [`bytecode`] define the on-disk shapes and decode them, [`context`] owns
//! the mutable state one match needs, and [`vm`] runs the decoded program
//! to a yes/no recognition result. [`error`] carries the two fault kinds
//! that can cross those boundaries.

pub mod bitset;
pub mod bytecode;
pub mod context;
pub mod error;
pub mod vm;

pub use bytecode::{load_bytecode, parse_bytecode, Op, Program};
pub use context::Context;
pub use error::{FatalRuntimeError, LoadError};
pub use vm::execute;
