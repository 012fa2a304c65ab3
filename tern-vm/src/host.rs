//! Host trap interfaces.
//!
//! The interpreter never grows memory, collects garbage, runs C code or
//! resolves dispatch tables itself; it escapes through this trait. Trap
//! calls are synchronous: whatever the host returns is committed before
//! the next instruction decodes, and the host may relocate the heap and
//! the active stack as long as the returned state is consistent.

use crate::consts::VM_REGISTER_COUNT;
use crate::error::VmError;
use crate::memory::VmMemory;
use crate::stack::StackObject;

use tern_asm::Word;

/// State handed to a capacity trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRequest {
    /// Allocation pointer at the trap.
    pub heap_top: Word,
    /// Heap limit at the trap.
    pub heap_limit: Word,
    /// Current frame address; already flushed into the stack object.
    pub stack_pointer: Word,
    /// Tagged reference of the running stack.
    pub current_stack: Word,
    /// Bytes the trapping instruction needs.
    pub requested: Word,
}

/// State a capacity trap hands back; committed wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapUpdate {
    /// New allocation pointer.
    pub heap_top: Word,
    /// New heap limit; `heap_top + requested <= heap_limit` must hold.
    pub heap_limit: Word,
    /// Tagged reference of the (possibly moved) running stack.
    pub current_stack: Word,
}

/// External services the interpreter traps into.
pub trait Host {
    /// Run the C function at `faddr`, marshalling through the register
    /// file as described by `format`.
    fn call_c(
        &mut self,
        format: u32,
        faddr: Word,
        registers: &mut [Word; VM_REGISTER_COUNT],
        memory: &mut VmMemory,
    ) -> Result<(), VmError>;

    /// The collector: make `req.requested` bytes available on the heap.
    fn extend_heap(&mut self, memory: &mut VmMemory, req: HeapRequest)
        -> Result<HeapUpdate, VmError>;

    /// The stack extender: give the running stack `req.requested` free
    /// bytes, relocating its frame region if needed.
    fn extend_stack(
        &mut self,
        memory: &mut VmMemory,
        req: HeapRequest,
    ) -> Result<HeapUpdate, VmError>;

    /// Variant/table dispatch oracle.
    fn dispatch_branch(&mut self, format: u32, registers: &[Word; VM_REGISTER_COUNT]) -> u32;

    /// Diagnostic stack-trace sink.
    fn print_stack_trace(&mut self, memory: &VmMemory, stack: Word);
}

/// Grow-only host: extends the heap tail instead of collecting and
/// relocates stack regions within the arena. Runs no C functions and
/// answers every dispatch with index zero.
#[derive(Debug, Clone, Copy)]
pub struct GrowHost {
    /// Minimum bytes added per heap extension.
    pub heap_chunk: Word,
}

impl GrowHost {
    /// Host with the default 64 KiB growth chunk.
    pub fn new() -> Self {
        Self {
            heap_chunk: 64 * 1024,
        }
    }
}

impl Default for GrowHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for GrowHost {
    fn call_c(
        &mut self,
        _format: u32,
        faddr: Word,
        _registers: &mut [Word; VM_REGISTER_COUNT],
        _memory: &mut VmMemory,
    ) -> Result<(), VmError> {
        Err(VmError::Io(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("GrowHost has no C launcher (faddr {faddr:#x})"),
        )))
    }

    fn extend_heap(
        &mut self,
        memory: &mut VmMemory,
        req: HeapRequest,
    ) -> Result<HeapUpdate, VmError> {
        // Growing in place is only sound while the heap is the tail region.
        if req.heap_limit != memory.len() {
            return Err(VmError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "heap limit is not the image tail",
            )));
        }

        let heap_limit = memory.grow(req.requested.max(self.heap_chunk));
        tracing::debug!(requested = req.requested, heap_limit, "heap grown");

        Ok(HeapUpdate {
            heap_top: req.heap_top,
            heap_limit,
            current_stack: req.current_stack,
        })
    }

    fn extend_stack(
        &mut self,
        memory: &mut VmMemory,
        req: HeapRequest,
    ) -> Result<HeapUpdate, VmError> {
        let stk = StackObject::from_ref(req.current_stack);
        let old_frames = stk.frames(memory);
        let old_size = stk.size(memory);

        let new_size = (old_size * 2).max(old_size + req.requested);
        let new_frames = memory.alloc_region(new_size)?;

        memory.copy(old_frames, new_frames, old_size);
        stk.set_frames(memory, new_frames);
        stk.set_size(memory, new_size);
        stk.set_stack_pointer(memory, new_frames + (req.stack_pointer - old_frames));

        tracing::debug!(old_size, new_size, "stack region relocated");

        Ok(HeapUpdate {
            heap_top: req.heap_top,
            heap_limit: req.heap_limit,
            current_stack: req.current_stack,
        })
    }

    fn dispatch_branch(&mut self, _format: u32, _registers: &[Word; VM_REGISTER_COUNT]) -> u32 {
        0
    }

    fn print_stack_trace(&mut self, memory: &VmMemory, stack: Word) {
        let stk = StackObject::from_ref(stack);
        tracing::debug!(
            stack,
            frames = stk.frames(memory),
            stack_pointer = stk.stack_pointer(memory),
            pc = stk.pc(memory),
            "stack trace requested"
        );
    }
}
