//! [`Interpreter`] implementation.
//!
//! The dispatch loop lives in [`executor`]; the other submodules hold the
//! `pub(crate)` helpers it delegates to, grouped by concern.

use crate::consts::*;
use crate::error::VmError;
use crate::memory::VmMemory;
use crate::program::Program;
use crate::stack::{Frame, StackObject};
use crate::value;

use tern_asm::{SlotId, Word};

mod alu;
mod executor;
mod flow;
mod memory;

/// VM interpreter over a host `H` providing the trap services.
///
/// While a stack runs, `sp`, `pc` and the derived `stack_end` are
/// authoritative; they are flushed into the stack object at suspension
/// points and before every trap, and reloaded after, so the host may move
/// the heap and the active frame region.
#[derive(Debug)]
pub struct Interpreter<H> {
    registers: [Word; VM_REGISTER_COUNT],
    memory: VmMemory,
    program: Program,
    host: H,
    params: VmParams,
    heap_top: Word,
    heap_limit: Word,
    current_stack: Word,
    sp: Word,
    stack_end: Word,
    pc: Word,
}

impl<H> Interpreter<H> {
    /// Interpreter with default parameters. The heap is the image's tail
    /// region, initially empty.
    pub fn new(program: Program, memory: VmMemory, host: H) -> Self {
        Self::with_params(program, memory, host, VmParams::default())
    }

    /// Interpreter with explicit parameters.
    pub fn with_params(program: Program, memory: VmMemory, host: H, params: VmParams) -> Self {
        let heap_top = memory.map().heap_base;
        let heap_limit = memory.len();

        Self {
            registers: [0; VM_REGISTER_COUNT],
            memory,
            program,
            host,
            params,
            heap_top,
            heap_limit,
            current_stack: 0,
            sp: 0,
            stack_end: 0,
            pc: 0,
        }
    }

    /// Current state of the registers.
    pub const fn registers(&self) -> &[Word; VM_REGISTER_COUNT] {
        &self.registers
    }

    /// Mutable register file, for marshalling C-call arguments.
    pub fn registers_mut(&mut self) -> &mut [Word; VM_REGISTER_COUNT] {
        &mut self.registers
    }

    /// The memory image.
    pub const fn memory(&self) -> &VmMemory {
        &self.memory
    }

    /// Mutable memory image, for loaders writing globals and constants.
    pub fn memory_mut(&mut self) -> &mut VmMemory {
        &mut self.memory
    }

    /// The loaded program.
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Host reference.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host reference.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current byte offset into the instruction stream.
    pub const fn pc(&self) -> Word {
        self.pc
    }

    /// Allocation pointer.
    pub const fn heap_top(&self) -> Word {
        self.heap_top
    }

    /// Heap limit.
    pub const fn heap_limit(&self) -> Word {
        self.heap_limit
    }

    /// Tagged reference of the running (or last run) stack.
    pub const fn current_stack(&self) -> Word {
        self.current_stack
    }

    /// Current frame address.
    pub const fn stack_pointer(&self) -> Word {
        self.sp
    }

    pub(crate) const fn frame(&self) -> Frame {
        Frame::at(self.sp)
    }

    pub(crate) fn local(&self, i: SlotId) -> Word {
        self.frame().slot(&self.memory, i)
    }

    pub(crate) fn set_local(&mut self, i: SlotId, v: Word) {
        Frame::at(self.sp).set_slot(&mut self.memory, i, v);
    }

    pub(crate) fn code_offset(&self, fid: u32) -> Result<Word, VmError> {
        self.program
            .code_offset(fid)
            .ok_or(VmError::UnknownFunction { fid })
    }

    /// Bump past the current frame and root a fresh one returning to the
    /// current pc.
    pub(crate) fn push_frame(&mut self, num_locals: Word) {
        self.sp += Frame::bytes(num_locals);

        let frame = Frame::at(self.sp);
        frame.set_return_pc(&mut self.memory, self.pc as i64);
        frame.set_liveness(&mut self.memory, 0);
    }

    pub(crate) fn pop_frame(&mut self, num_locals: Word) {
        self.sp -= Frame::bytes(num_locals);
    }

    /// Save the running stack's pointer and pc into its heap object.
    pub(crate) fn flush_stack_state(&mut self) {
        let stk = StackObject::from_ref(self.current_stack);
        stk.set_stack_pointer(&mut self.memory, self.sp);
        stk.set_pc(&mut self.memory, self.pc);
    }

    /// Refresh every cached pointer from the authoritative stack object.
    pub(crate) fn reload_stack_state(&mut self) {
        let stk = StackObject::from_ref(self.current_stack);
        self.sp = stk.stack_pointer(&self.memory);
        self.pc = stk.pc(&self.memory);
        self.stack_end = stk.limit(&self.memory);
    }

    pub(crate) fn load_stack(&mut self, stack_ref: Word) {
        self.current_stack = stack_ref;
        self.reload_stack_state();
    }

    /// Allocate a suspended stack for function `fid`: a stack object on
    /// the heap and a frame region from the arena, rooted with the
    /// terminating return pc.
    ///
    /// The opcode path runs behind a RESERVE and does not bounds-check
    /// the object allocation.
    pub(crate) fn create_stack(&mut self, fid: u32) -> Result<Word, VmError> {
        let entry = self.code_offset(fid)?;
        let size = self.params.stack_region_bytes;
        let frames = self.memory.alloc_region(size)?;

        let root = Frame::at(frames);
        root.set_return_pc(&mut self.memory, -1);
        root.set_liveness(&mut self.memory, 0);

        let stk = StackObject::at(self.heap_top);
        stk.init(&mut self.memory, frames, size, entry);
        self.heap_top += STACK_OBJECT_BYTES;

        tracing::debug!(fid, frames, "stack created");

        Ok(stk.tagged_ref())
    }

    /// Host-side stack creation, bounds-checked against the heap.
    pub fn spawn_stack(&mut self, fid: u32) -> Result<Word, VmError> {
        if self.heap_top + STACK_OBJECT_BYTES > self.heap_limit {
            return Err(VmError::HeapExhausted {
                requested: STACK_OBJECT_BYTES,
            });
        }

        self.create_stack(fid)
    }

    pub(crate) fn dump_slot(&self, i: SlotId) {
        let w = self.local(i);
        println!(
            "slot[{i}] = {w:#018x} long:{} int:{} float:{} double:{} payload:{}",
            w as i64,
            w as u32 as i32,
            f32::from_bits(w as u32),
            f64::from_bits(w),
            value::payload(w),
        );
    }
}
