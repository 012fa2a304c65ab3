use tern_asm::Asm;
use tern_vm::prelude::*;

/// Host for the scenarios: grow-only capacity behavior plus a scripted
/// dispatch oracle, a register-convention C launcher and recording sinks.
pub struct TestHost {
    inner: GrowHost,
    pub dispatch_index: u32,
    pub c_calls: Vec<(u32, Word)>,
    pub traces: Vec<Word>,
}

impl TestHost {
    pub fn new(dispatch_index: u32) -> Self {
        Self {
            inner: GrowHost::new(),
            dispatch_index,
            c_calls: Vec::new(),
            traces: Vec::new(),
        }
    }
}

impl Host for TestHost {
    fn call_c(
        &mut self,
        format: u32,
        faddr: Word,
        registers: &mut [Word; VM_REGISTER_COUNT],
        _memory: &mut VmMemory,
    ) -> Result<(), VmError> {
        self.c_calls.push((format, faddr));
        registers[3] = registers[1].wrapping_add(registers[2]);
        Ok(())
    }

    fn extend_heap(
        &mut self,
        memory: &mut VmMemory,
        req: HeapRequest,
    ) -> Result<HeapUpdate, VmError> {
        self.inner.extend_heap(memory, req)
    }

    fn extend_stack(
        &mut self,
        memory: &mut VmMemory,
        req: HeapRequest,
    ) -> Result<HeapUpdate, VmError> {
        self.inner.extend_stack(memory, req)
    }

    fn dispatch_branch(&mut self, _format: u32, _registers: &[Word; VM_REGISTER_COUNT]) -> u32 {
        self.dispatch_index
    }

    fn print_stack_trace(&mut self, _memory: &VmMemory, stack: Word) {
        self.traces.push(stack);
    }
}

pub fn program(asm: Asm, code_offsets: Vec<u32>) -> Program {
    let mut program = Program::new(asm.into_words());
    program.code_offsets = code_offsets;
    program
}

pub fn boot(asm: Asm, code_offsets: Vec<u32>) -> Interpreter<GrowHost> {
    Interpreter::new(program(asm, code_offsets), VmMemory::new(), GrowHost::new())
}

pub fn boot_host(asm: Asm, code_offsets: Vec<u32>, host: TestHost) -> Interpreter<TestHost> {
    Interpreter::new(program(asm, code_offsets), VmMemory::new(), host)
}

/// Slot `i` of the frame the interpreter's stack pointer addresses.
pub fn local<H>(vm: &Interpreter<H>, i: SlotId) -> Word {
    Frame::at(vm.stack_pointer()).slot(vm.memory(), i)
}
