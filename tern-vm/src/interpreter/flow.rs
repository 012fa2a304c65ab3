use super::Interpreter;
use crate::consts::*;
use crate::error::VmError;
use crate::host::{HeapRequest, HeapUpdate, Host};
use crate::state::ExecuteState;
use crate::value;

use tern_asm::{OpF, SlotId, Word};

impl<H> Interpreter<H> {
    /// Branch offsets are word counts relative to the first word of the
    /// branching instruction.
    pub(crate) fn branch(&mut self, pc0: Word, offset: i32) {
        self.pc = (pc0 as i64 + 4 * offset as i64) as Word;
    }

    pub(crate) fn cond_branch(&mut self, pc0: Word, ops: OpF, taken: bool) {
        self.branch(pc0, if taken { ops.n1 } else { ops.n2 });
    }

    pub(crate) fn jump_byte(&mut self, pc0: Word, f: impl FnOnce(u8, u8) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local_u8(ops.x), self.local_u8(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    pub(crate) fn jump_int(&mut self, pc0: Word, f: impl FnOnce(i32, i32) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local_i32(ops.x), self.local_i32(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    pub(crate) fn jump_uint(&mut self, pc0: Word, f: impl FnOnce(u32, u32) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local(ops.x) as u32, self.local(ops.y) as u32);
        self.cond_branch(pc0, ops, taken);
    }

    pub(crate) fn jump_long(&mut self, pc0: Word, f: impl FnOnce(i64, i64) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local_i64(ops.x), self.local_i64(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    pub(crate) fn jump_ulong(&mut self, pc0: Word, f: impl FnOnce(u64, u64) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local(ops.x), self.local(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    pub(crate) fn jump_float(&mut self, pc0: Word, f: impl FnOnce(f32, f32) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local_f32(ops.x), self.local_f32(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    pub(crate) fn jump_double(&mut self, pc0: Word, f: impl FnOnce(f64, f64) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local_f64(ops.x), self.local_f64(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    /// Tagged jumps compare whole words in signed order.
    pub(crate) fn jump_tagged(&mut self, pc0: Word, f: impl FnOnce(i64, i64) -> bool) {
        let ops = self.ops_f(pc0);
        let taken = f(self.local_i64(ops.x), self.local_i64(ops.y));
        self.cond_branch(pc0, ops, taken);
    }

    /// Function id held by the closure object a slot references.
    pub(crate) fn closure_code(&self, slot: SlotId) -> u32 {
        let obj = value::ref_to_addr(self.local(slot));
        self.memory.read_u64(obj + FN_CODE) as u32
    }

    /// Push a frame returning to the instruction after the call site and
    /// jump to the function's entry.
    pub(crate) fn enter_call(&mut self, fid: u32, num_locals: Word) -> Result<(), VmError> {
        let entry = self.code_offset(fid)?;
        self.push_frame(num_locals);
        self.pc = entry;

        Ok(())
    }

    /// Reuse the current frame; the callee returns through our caller.
    pub(crate) fn enter_tail_call(&mut self, fid: u32) -> Result<(), VmError> {
        self.pc = self.code_offset(fid)?;

        Ok(())
    }

    /// RETURN: a negative saved pc marks the root frame and finishes the
    /// run; otherwise control moves there. The frame itself is popped by
    /// the POP_FRAME paired with the call site.
    pub(crate) fn ret(&mut self) -> ExecuteState {
        let return_pc = self.frame().return_pc(&self.memory);
        if return_pc < 0 {
            self.flush_stack_state();
            return ExecuteState::Return;
        }

        self.pc = return_pc as Word;

        ExecuteState::Proceed
    }

    /// YIELD: suspend into the stack object, resume the referenced stack
    /// where it left off.
    pub(crate) fn switch_stack(&mut self, slot: SlotId) {
        let target = self.local(slot);
        tracing::trace!(from = self.current_stack, to = target, "yield");

        self.flush_stack_state();
        self.load_stack(target);
    }

    pub(crate) fn heap_request(&self, requested: Word) -> HeapRequest {
        HeapRequest {
            heap_top: self.heap_top,
            heap_limit: self.heap_limit,
            stack_pointer: self.sp,
            current_stack: self.current_stack,
            requested,
        }
    }

    /// Commit a trap's returned pointers and refresh everything derived
    /// from the (possibly relocated) current stack.
    pub(crate) fn commit(&mut self, update: HeapUpdate) {
        self.heap_top = update.heap_top;
        self.heap_limit = update.heap_limit;
        self.current_stack = update.current_stack;
        self.reload_stack_state();
    }
}

impl<H> Interpreter<H>
where
    H: Host,
{
    /// Prologue bound check: the function's own frame plus one more
    /// header must fit, otherwise the stack extender runs first.
    pub(crate) fn fn_entry(&mut self, num_locals: Word) -> Result<(), VmError> {
        let needed = num_locals * 8 + 2 * FRAME_HEADER_SIZE;
        if self.sp + needed <= self.stack_end {
            return Ok(());
        }

        tracing::debug!(num_locals, needed, "stack extension trap");

        self.flush_stack_state();
        let req = self.heap_request(needed);
        let update = self.host.extend_stack(&mut self.memory, req)?;
        self.commit(update);
        self.registers[REG_TRAP_STATUS] = 0;

        Ok(())
    }

    /// Explicit collector trap.
    pub(crate) fn collect(&mut self, requested: Word) -> Result<(), VmError> {
        tracing::debug!(requested, "collector trap");

        self.flush_stack_state();
        let req = self.heap_request(requested);
        let update = self.host.extend_heap(&mut self.memory, req)?;
        self.commit(update);
        self.registers[REG_TRAP_STATUS] = 0;

        Ok(())
    }

    /// C call: a spacer frame keeps the caller's slots rooted while the
    /// host runs, then is popped again.
    pub(crate) fn call_c_function(
        &mut self,
        format: u32,
        num_locals: Word,
        faddr: Word,
    ) -> Result<(), VmError> {
        self.push_frame(num_locals);
        self.flush_stack_state();

        self.host
            .call_c(format, faddr, &mut self.registers, &mut self.memory)?;

        self.reload_stack_state();
        self.pop_frame(num_locals);

        Ok(())
    }

    /// DISPATCH family. The oracle picks a target index; the method form
    /// treats indices past the first two as function ids.
    pub(crate) fn dispatch(&mut self, pc0: Word, method: bool) -> Result<(), VmError> {
        let selector = tern_asm::unpack::a(self.code_word(pc0 / 4)).value;
        let count = self.code_word(pc0 / 4 + 1);
        self.pc = pc0 + 4 * (2 + count as Word);

        let index = self.host.dispatch_branch(selector, &self.registers);

        if method && index >= 2 {
            self.pc = self.code_offset(index - 2)?;
            return Ok(());
        }

        if index >= count {
            return Err(VmError::DispatchTarget {
                index,
                count,
                pc: pc0,
            });
        }

        let target = self.code_word(pc0 / 4 + 2 + index as Word) as i32;
        self.branch(pc0, target);

        Ok(())
    }

    /// Diagnostic trace through the host.
    pub(crate) fn print_stack_trace(&mut self, slot: SlotId) {
        self.flush_stack_state();
        let stack = self.local(slot);
        self.host.print_stack_trace(&self.memory, stack);
    }
}

impl<H> Interpreter<H> {
    pub(crate) fn code_word(&self, index: Word) -> u32 {
        self.program.code[index as usize]
    }
}
