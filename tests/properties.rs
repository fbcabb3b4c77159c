//! Property tests for the wire format and the execution engine's position
//! invariant, checked over randomly generated inputs rather than a fixed
//! example table.
//!
//! These build real bytecode images and decode them through the public
//! loader, rather than constructing `Op` vectors directly — the loader's
//! own shape is part of what is under test here.

use pegvm::bitset::Bitset;
use pegvm::bytecode::MAGIC;
use pegvm::{parse_bytecode, Context};
use proptest::prelude::*;

fn header(inst_count: u16) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&MAGIC);
    buf.push(1); // version
    buf.extend_from_slice(&inst_count.to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes()); // memoSize
    buf.extend_from_slice(&0u16.to_be_bytes()); // jumpTableSize
    buf.extend_from_slice(&0u16.to_be_bytes()); // nameCount
    buf
}

fn pool_string(s: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(s.len() as u16).to_be_bytes());
    buf.extend_from_slice(s);
    buf.push(0); // trailing NUL
    buf
}

/// RSet digits ; Ret — greedily consumes a leading run of digit bytes.
fn digit_star_program() -> Vec<u8> {
    let mut digits = Bitset::new();
    for d in b'0'..=b'9' {
        digits.set(d);
    }

    let mut buf = header(2);
    buf.extend_from_slice(&1u16.to_be_bytes()); // setCount
    buf.extend_from_slice(&digits.to_wire_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes()); // strCount
    buf.extend_from_slice(&0u16.to_be_bytes()); // tagTableSize
    buf.extend_from_slice(&0u16.to_be_bytes()); // symbolTableSize

    buf.push(25); // RSet (legacy numeric remap)
    buf.extend_from_slice(&0u16.to_be_bytes()); // set index 0

    buf.push(7); // Ret

    buf
}

/// Str "match" ; Ret
fn str_match_program() -> Vec<u8> {
    let mut buf = header(2);
    buf.extend_from_slice(&0u16.to_be_bytes()); // setCount
    buf.extend_from_slice(&1u16.to_be_bytes()); // strCount
    buf.extend_from_slice(&pool_string(b"match"));
    buf.extend_from_slice(&0u16.to_be_bytes()); // tagTableSize
    buf.extend_from_slice(&0u16.to_be_bytes()); // symbolTableSize

    buf.push(14); // Str
    buf.extend_from_slice(&0u16.to_be_bytes()); // string index 0

    buf.push(7); // Ret

    buf
}

proptest! {
    /// Every byte set into a `Bitset` and round-tripped through its wire
    /// form comes back exactly as set, for any subset of byte values.
    #[test]
    fn bitset_wire_round_trip(members in proptest::collection::vec(0u8..=255, 0..64)) {
        let mut bs = Bitset::new();
        for &m in &members {
            bs.set(m);
        }
        let decoded = Bitset::from_wire_bytes(bs.to_wire_bytes());
        for byte in 0u8..=255 {
            prop_assert_eq!(bs.get(byte), decoded.get(byte));
        }
    }

    /// `execute` never leaves `pos` outside `[0, input_size]`, for any
    /// input against a small loaded grammar exercising greedy class
    /// repetition.
    #[test]
    fn position_stays_within_input_bounds(input in proptest::collection::vec(1u8..=255, 0..32)) {
        let bytecode = digit_star_program();
        let mut ctx = Context::from_bytes(input);
        let program = parse_bytecode(&bytecode, &mut ctx).unwrap();
        let result = pegvm::execute(&mut ctx, &program);

        prop_assert!(result.is_ok());
        prop_assert!(ctx.pos() <= ctx.input_size());
    }

    /// A literal string's `Str` opcode only succeeds when the bytes at
    /// `pos` exactly match the pool entry, and always advances by the
    /// pool entry's exact length on success.
    #[test]
    fn str_match_advances_by_exact_length(tail in proptest::collection::vec(0u8..=255, 0..16)) {
        let bytecode = str_match_program();
        let mut input = b"match".to_vec();
        input.extend_from_slice(&tail);

        let mut ctx = Context::from_bytes(input);
        let program = parse_bytecode(&bytecode, &mut ctx).unwrap();
        let result = pegvm::execute(&mut ctx, &program).unwrap();

        prop_assert_eq!(result, 1);
        prop_assert_eq!(ctx.pos(), 5);
    }
}
