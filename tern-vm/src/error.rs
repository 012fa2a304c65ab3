//! Runtime interpreter error implementation.
//!
//! Capacity shortfalls (heap at RESERVE, stack at FNENTRY) are not errors:
//! they trap to the host and resume. Everything here halts the run; the
//! variants other than [`VmError::Io`] are assertions against the
//! bytecode producer and never fire on well-formed images.

use tern_asm::{Opcode, Word};

use std::io;
use thiserror::Error;

/// Fatal interpreter error variants.
#[derive(Debug, Error)]
pub enum VmError {
    /// The byte at the instruction boundary names no opcode.
    #[error("invalid opcode {opcode:#04x} at byte offset {pc}")]
    InvalidOpcode {
        /// The offending byte.
        opcode: u8,
        /// Byte offset of the instruction.
        pc: Word,
    },
    /// A retired encoding was executed.
    #[error("removed opcode {opcode:?} at byte offset {pc}")]
    RemovedOpcode {
        /// The retired opcode.
        opcode: Opcode,
        /// Byte offset of the instruction.
        pc: Word,
    },
    /// Integer division or remainder by zero.
    #[error("division by zero at byte offset {pc}")]
    DivideByZero {
        /// Byte offset of the instruction.
        pc: Word,
    },
    /// The dispatch oracle produced an index outside the target table.
    #[error("dispatch index {index} outside table of {count} targets at byte offset {pc}")]
    DispatchTarget {
        /// Oracle answer.
        index: u32,
        /// Encoded target count.
        count: u32,
        /// Byte offset of the instruction.
        pc: Word,
    },
    /// A called function id has no code offset.
    #[error("unknown function id {fid}")]
    UnknownFunction {
        /// The function id.
        fid: u32,
    },
    /// The stack-region arena cannot satisfy a frame-region request.
    #[error("stack-region arena exhausted requesting {requested} bytes")]
    StackArenaExhausted {
        /// Bytes asked for.
        requested: Word,
    },
    /// Host-side stack creation found no heap room for the stack object.
    #[error("heap exhausted requesting {requested} bytes")]
    HeapExhausted {
        /// Bytes asked for.
        requested: Word,
    },
    /// I/O and host-callback failures; always halts.
    #[error("unrecoverable host error: {0}")]
    Io(#[from] io::Error),
}
