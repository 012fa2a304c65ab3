use tern_asm::{op, Asm};
use tern_vm::consts::{OBJECT_HEADER_SIZE, STACK_OBJECT_BYTES};
use tern_vm::prelude::*;

#[allow(dead_code)]
mod common;

use common::local;

#[test]
fn new_stack_is_created_suspended() {
    let mut asm = Asm::new();
    asm.op(op::new_stack(0, 1)).op(op::ret());
    let f1 = asm.here() as u32;
    asm.op(op::ret());

    let mut vm = common::boot(asm, vec![0, f1]);
    vm.run(0).expect("new stack");

    let r = local(&vm, 0);
    let stk = StackObject::from_ref(r);
    let mem = vm.memory();

    assert_eq!(mem.read_u64(value::ref_to_addr(r)), value::STACK_TYPE);
    assert_eq!(stk.pc(mem), f1 as Word * 4, "saved pc is the entry point");
    assert_eq!(stk.stack_pointer(mem), stk.frames(mem));
    assert_eq!(stk.size(mem), 4096);

    let root = Frame::at(stk.frames(mem));
    assert_eq!(root.return_pc(mem), -1);
    assert_eq!(root.liveness(mem), 0);
}

/// Scenario: A yields to B, B yields back, twice, then A returns. Each
/// side must resume exactly after its own YIELD with its own frame.
///
/// The two stacks meet through global 0, where A publishes its reference.
#[test]
fn coroutine_ping_pong() {
    let mut asm = Asm::new();
    // fn0, stack A
    asm.op(op::current_stack(1))
        .op(op::set_local_global(2, 0))
        .op(op::store8(2, 1, 0))
        .op(op::new_stack(0, 1))
        .op(op::set_local_signed(3, 1))
        .op(op::yield_to(0))
        .op(op::set_local_signed(4, 2))
        .op(op::yield_to(0))
        .op(op::ret());
    // fn1, stack B
    let f1 = asm.here() as u32;
    asm.op(op::set_local_global(1, 0))
        .op(op::load8(0, 1, 0))
        .op(op::set_local_signed(2, 10))
        .op(op::yield_to(0))
        .op(op::set_local_signed(3, 11))
        .op(op::yield_to(0));
    let b_after_final_yield = asm.here() as Word;
    asm.op(op::ret());

    let mut program = common::program(asm, vec![0, f1]);
    program.global_offsets = vec![0];

    let mut vm = Interpreter::new(program, VmMemory::new(), GrowHost::new());
    let exit = vm.run(0).expect("ping pong");

    // A ran to its root return with both resumption markers set.
    assert_eq!(local(&vm, 3), 1);
    assert_eq!(local(&vm, 4), 2);

    // B is suspended after its final yield, frame intact.
    let b = StackObject::from_ref(local(&vm, 0));
    let mem = vm.memory();
    assert_eq!(b.pc(mem), b_after_final_yield * 4);
    assert_eq!(b.stack_pointer(mem), b.frames(mem), "B never pushed a frame");

    let b_frame = Frame::at(b.frames(mem));
    assert_eq!(b_frame.slot(mem, 2), 10, "set before B's first yield");
    assert_eq!(b_frame.slot(mem, 3), 11, "set after B's second resume");

    // The exited current stack is A.
    let a = StackObject::from_ref(exit.current_stack);
    assert_eq!(mem.read_u64(value::ref_to_addr(exit.current_stack)), value::STACK_TYPE);
    assert_eq!(a.stack_pointer(mem), a.frames(mem));
}

#[test]
fn yield_resumes_at_the_next_instruction() {
    // A: yield to B once; B: immediately yield back, then park forever.
    let mut asm = Asm::new();
    asm.op(op::current_stack(1))
        .op(op::set_local_global(2, 0))
        .op(op::store8(2, 1, 0))
        .op(op::new_stack(0, 1))
        .op(op::yield_to(0))
        .op(op::set_local_signed(5, 123))
        .op(op::ret());
    let f1 = asm.here() as u32;
    asm.op(op::set_local_global(1, 0))
        .op(op::load8(0, 1, 0))
        .op(op::yield_to(0))
        .op(op::ret());

    let mut program = common::program(asm, vec![0, f1]);
    program.global_offsets = vec![0];

    let mut vm = Interpreter::new(program, VmMemory::new(), GrowHost::new());
    vm.run(0).expect("yield round trip");

    assert_eq!(local(&vm, 5), 123, "A resumed after its yield");

    // While A was parked its saved pc pointed right after the yield.
    let b = StackObject::from_ref(local(&vm, 0));
    let b_frame = Frame::at(b.frames(vm.memory()));
    let a_ref = b_frame.slot(vm.memory(), 0);
    assert_eq!(
        StackObject::from_ref(a_ref).frames(vm.memory()),
        StackObject::from_ref(a_ref).stack_pointer(vm.memory())
    );
}

#[test]
fn flush_externalizes_pointer_and_pc() {
    // After FLUSH, the stack object's saved pc can be read back from
    // inside the running program. The pc field sits at ref + 7 + 32.
    let pc_field = (OBJECT_HEADER_SIZE + 24) as i32 - 1;

    let mut asm = Asm::new();
    asm.op(op::flush_vm())
        .op(op::current_stack(0))
        .op(op::load8(1, 0, pc_field))
        .op(op::load8(2, 0, pc_field - 8))
        .op(op::ret());

    let mut vm = common::boot(asm, vec![0]);
    let exit = vm.run(0).expect("flush");

    assert_eq!(local(&vm, 1), 4, "pc flushed past the FLUSH instruction");
    assert_eq!(local(&vm, 2), vm.stack_pointer(), "sp flushed");
    assert_eq!(exit.current_stack, local(&vm, 0));
}

#[test]
fn spawned_stacks_are_distinct_objects() {
    let mut asm = Asm::new();
    asm.op(op::new_stack(0, 1)).op(op::new_stack(1, 1)).op(op::ret());
    let f1 = asm.here() as u32;
    asm.op(op::ret());

    let mut vm = common::boot(asm, vec![0, f1]);
    let heap_top = vm.heap_top();
    vm.run(0).expect("two stacks");

    let first = local(&vm, 0);
    let second = local(&vm, 1);
    assert_ne!(first, second);
    assert_eq!(value::ref_to_addr(first), heap_top + STACK_OBJECT_BYTES);
    assert_eq!(
        value::ref_to_addr(second),
        heap_top + 2 * STACK_OBJECT_BYTES
    );

    let mem = vm.memory();
    assert_ne!(
        StackObject::from_ref(first).frames(mem),
        StackObject::from_ref(second).frames(mem)
    );
}
