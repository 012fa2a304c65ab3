//! Instruction-word construction for each operand format.
//!
//! Fields wider than their encoded width are truncated, mirroring the
//! extraction masks in [`crate::unpack`].

use crate::opcode::Opcode;
use crate::types::SlotId;

const SLOT_MASK: u64 = 0x3ff;

fn slot(x: SlotId) -> u64 {
    x as u64 & SLOT_MASK
}

/// Format A, unsigned.
pub fn a(op: Opcode, value: u32) -> [u32; 1] {
    [op as u32 | ((value & 0x00ff_ffff) << 8)]
}

/// Format A, signed.
pub fn a_signed(op: Opcode, value: i32) -> [u32; 1] {
    a(op, value as u32)
}

/// Format B.
pub fn b(op: Opcode, x: SlotId, value: u32) -> [u32; 1] {
    [op as u32 | ((slot(x) as u32) << 8) | ((value & 0x3fff) << 18)]
}

/// Format C.
pub fn c(op: Opcode, x: SlotId, y: SlotId, value: i32) -> [u32; 2] {
    [
        op as u32 | ((slot(x) as u32) << 8) | ((slot(y) as u32) << 22),
        value as u32,
    ]
}

/// Format D.
pub fn d(op: Opcode, x: SlotId, y: SlotId, value: u64) -> [u32; 3] {
    [
        op as u32 | ((slot(x) as u32) << 8) | ((slot(y) as u32) << 22),
        value as u32,
        (value >> 32) as u32,
    ]
}

/// Format E.
pub fn e(op: Opcode, x: SlotId, y: SlotId, z: SlotId, value: i32) -> [u32; 2] {
    let v = op as u64
        | (slot(x) << 8)
        | (slot(y) << 18)
        | (slot(z) << 28)
        | ((value as u64 & 0x3ff_ffff) << 38);
    [v as u32, (v >> 32) as u32]
}

/// Format F.
pub fn f(op: Opcode, x: SlotId, y: SlotId, n1: i32, n2: i32) -> [u32; 2] {
    let v = op as u64
        | (slot(x) << 8)
        | (slot(y) << 18)
        | ((n1 as u64 & 0x3ffff) << 28)
        | ((n2 as u64 & 0x3ffff) << 46);
    [v as u32, (v >> 32) as u32]
}

/// Dispatch family: a 24-bit selector word, a count word, then the targets.
pub fn tgts(op: Opcode, format: u32, targets: &[i32]) -> Vec<u32> {
    let mut words = Vec::with_capacity(2 + targets.len());
    words.extend_from_slice(&a(op, format));
    words.push(targets.len() as u32);
    words.extend(targets.iter().map(|&t| t as u32));
    words
}
