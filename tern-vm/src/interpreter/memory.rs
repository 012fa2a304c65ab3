use super::Interpreter;
use crate::consts::*;
use crate::error::VmError;
use crate::value;

use tern_asm::{OpE, SlotId, Word};

/// Loads, stores and the allocation fast path. Addresses are byte offsets
/// into the flat image; the bytecode producer owns their validity.
impl<H> Interpreter<H> {
    /// `base + [index +] offset` for a load: base in `y`, index in `z`.
    fn load_addr(&self, ops: &OpE, indexed: bool) -> Word {
        let base = self.local(ops.y) as i64;
        let index = if indexed { self.local(ops.z) as i64 } else { 0 };

        (base + index + ops.value as i64) as Word
    }

    /// `base + [index +] offset` for a store: base in `x`, index in `z`.
    fn store_addr(&self, ops: &OpE, indexed: bool) -> Word {
        let base = self.local(ops.x) as i64;
        let index = if indexed { self.local(ops.z) as i64 } else { 0 };

        (base + index + ops.value as i64) as Word
    }

    /// One-byte loads zero-extend.
    pub(crate) fn load1(&mut self, ops: OpE, indexed: bool) {
        let v = self.memory.read_u8(self.load_addr(&ops, indexed));
        self.set_local(ops.x, v as Word);
    }

    /// Four-byte loads sign-extend, matching int slot storage.
    pub(crate) fn load4(&mut self, ops: OpE, indexed: bool) {
        let v = self.memory.read_u32(self.load_addr(&ops, indexed)) as i32;
        self.set_local_i32(ops.x, v);
    }

    pub(crate) fn load8(&mut self, ops: OpE, indexed: bool) {
        let v = self.memory.read_u64(self.load_addr(&ops, indexed));
        self.set_local(ops.x, v);
    }

    pub(crate) fn store1(&mut self, ops: OpE, indexed: bool) {
        let addr = self.store_addr(&ops, indexed);
        let v = self.local_u8(ops.y);
        self.memory.write_u8(addr, v);
    }

    pub(crate) fn store4(&mut self, ops: OpE, indexed: bool) {
        let addr = self.store_addr(&ops, indexed);
        let v = self.local(ops.y) as u32;
        self.memory.write_u32(addr, v);
    }

    pub(crate) fn store8(&mut self, ops: OpE, indexed: bool) {
        let addr = self.store_addr(&ops, indexed);
        let v = self.local(ops.y);
        self.memory.write_u64(addr, v);
    }

    /// RESERVE fast path: when the heap fits, control jumps `offset`
    /// words ahead to the allocation code. Otherwise the trap registers
    /// are loaded, a frame is pushed returning to the instruction after
    /// the RESERVE, and control enters the compiler's heap-extension
    /// stub, which ends in the GC opcode and a RETURN.
    pub(crate) fn reserve(
        &mut self,
        pc0: Word,
        offset: SlotId,
        num_locals: Word,
        size: Word,
    ) -> Result<(), VmError> {
        if self.heap_top + size <= self.heap_limit {
            self.pc = pc0 + 4 * offset as Word;
            return Ok(());
        }

        tracing::debug!(size, heap_top = self.heap_top, "heap reservation trap");

        self.registers[REG_TRAP_STATUS] = value::boolref(false);
        self.registers[REG_TRAP_KIND] = 1;
        self.registers[REG_TRAP_SIZE] = size;
        self.push_frame(num_locals);
        self.pc = self.code_offset(self.program.extend_heap_id)?;

        Ok(())
    }

    /// ALLOC: no bounds check; a successful RESERVE precedes every
    /// allocation sequence.
    pub(crate) fn alloc(&mut self, dst: SlotId, ty: Word, payload: Word) {
        let obj = self.heap_top;
        self.memory.write_u64(obj, ty);
        self.set_local(dst, value::addr_to_ref(obj));
        self.heap_top = obj + OBJECT_HEADER_SIZE + payload;
    }
}
