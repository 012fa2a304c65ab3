#![warn(missing_docs)]
//! Instruction atoms of the Tern VM.
//!
//! The stream is a sequence of 32-bit little-endian words; the low byte of
//! an instruction's first word is its [`Opcode`] and the rest decodes as
//! one of the [`Format`] layouts. [`pack`] and [`unpack`] are the two
//! halves of the wire codec; [`op`] builds instructions by name.

pub mod instruction;
pub mod op;
pub mod opcode;
pub mod pack;
pub mod types;
pub mod unpack;

pub use instruction::{Format, OpA, OpAs, OpB, OpC, OpD, OpE, OpF};
pub use op::Asm;
pub use opcode::{InvalidOpcode, Opcode};
pub use types::{Imm14, Imm24, RegId, SlotId, Word, SLOT_MAX, WORD_LEN};
