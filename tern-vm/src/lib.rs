#![warn(missing_docs)]
//! Tern VM interpreter.
//!
//! The execution core of the Tern bytecode machine: a tagged 64-bit value
//! system, coroutine stacks of precise frames (return pc plus liveness
//! bitmap), a bump-allocated heap whose capacity shortfalls trap to a
//! pluggable [`host::Host`], and a register dispatch loop over the
//! [`tern_asm`] instruction set.
//!
//! ```
//! use tern_asm::{op, Asm};
//! use tern_vm::prelude::*;
//!
//! let mut asm = Asm::new();
//! asm.op(op::set_local_signed(0, 7)).op(op::ret());
//!
//! let mut program = Program::new(asm.into_words());
//! program.code_offsets = vec![0];
//!
//! let mut vm = Interpreter::new(program, VmMemory::new(), GrowHost::new());
//! vm.run(0).unwrap();
//! ```

pub mod consts;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod memory;
pub mod program;
pub mod stack;
pub mod state;
pub mod value;

/// Commonly used items.
pub mod prelude {
    pub use tern_asm::{Opcode, SlotId, Word};

    pub use crate::consts::{VmParams, VM_REGISTER_COUNT};
    pub use crate::error::VmError;
    pub use crate::host::{GrowHost, HeapRequest, HeapUpdate, Host};
    pub use crate::interpreter::Interpreter;
    pub use crate::memory::{MemoryConfig, VmMemory};
    pub use crate::program::Program;
    pub use crate::stack::{Frame, StackObject};
    pub use crate::state::{ExecuteState, VmExit};
    pub use crate::value;
}
