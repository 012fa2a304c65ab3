use tern_asm::{op, pack, Asm, Opcode};
use tern_vm::prelude::*;

#[allow(dead_code)]
mod common;

use common::{boot, boot_host, local, TestHost};

#[test]
fn constant_return() {
    let mut asm = Asm::new();
    asm.op(op::set_local_signed(0, 7)).op(op::ret());

    let mut vm = boot(asm, vec![0]);
    let exit = vm.run(0).expect("constant return");

    assert_eq!(local(&vm, 0), 7);
    assert_eq!(exit.current_stack, vm.current_stack());

    // The exited stack is suspended with its state flushed.
    let stk = StackObject::from_ref(exit.current_stack);
    assert_eq!(stk.stack_pointer(vm.memory()), vm.stack_pointer());
}

#[test]
fn sum_loop() {
    // s = 0; i = 0; n = 10; do { s += i; i += 1 } while (i < n)
    let mut asm = Asm::new();
    asm.op(op::set_local_signed(0, 0))
        .op(op::set_local_signed(1, 0))
        .op(op::set_local_signed(2, 10))
        .op(op::set_local_signed(3, 1));
    let body = asm.here() as i32;
    asm.op(op::add_int(0, 0, 1)).op(op::add_int(1, 1, 3));
    let here = asm.here() as i32;
    asm.op(op::jump_lt_int(1, 2, body - here, 2)).op(op::ret());

    let mut vm = boot(asm, vec![0]);
    vm.run(0).expect("sum loop");

    assert_eq!(local(&vm, 0) as i64, 45);
    assert_eq!(local(&vm, 1) as i64, 10);
}

#[test]
fn moves_cover_every_source() {
    let mut asm = Asm::new();
    asm.op(op::set_local_unsigned(0, 0xffff_fff0)) // zero-extended
        .op(op::set_local(1, 0))
        .op(op::set_local_code(2, 7))
        .op(op::set_local_extern(3, 1))
        .op(op::set_local_wide(4, u64::MAX))
        .op(op::set_reg(4, 0))
        .op(op::get_reg(5, 4))
        .op(op::set_reg_code(6, 9))
        .op(op::get_reg(6, 6))
        .op(op::set_reg_extern(7, 0))
        .op(op::get_reg(7, 7))
        .op(op::set_reg_const(8, 1))
        .op(op::get_reg(8, 8))
        .op(op::set_reg_global(9, 0))
        .op(op::get_reg(9, 9))
        .op(op::ret());

    let mut program = common::program(asm, vec![0]);
    program.extern_table = vec![0xaaa, 0xbbb];
    program.global_offsets = vec![16];

    let mut vm = Interpreter::new(program, VmMemory::new(), GrowHost::new());
    let consts_table = vm.memory().map().consts_table;
    vm.memory_mut().write_u64(consts_table + 8, 0xc0ffee);
    vm.run(0).expect("moves");

    assert_eq!(local(&vm, 0), 0xffff_fff0);
    assert_eq!(local(&vm, 1), 0xffff_fff0);
    assert_eq!(local(&vm, 2), 7);
    assert_eq!(local(&vm, 3), 0xbbb);
    assert_eq!(local(&vm, 4), u64::MAX);
    assert_eq!(local(&vm, 5), 0xffff_fff0);
    assert_eq!(local(&vm, 6), 9);
    assert_eq!(local(&vm, 7), 0xaaa);
    assert_eq!(local(&vm, 8), 0xc0ffee);
    assert_eq!(local(&vm, 9), vm.memory().map().globals + 16);
}

#[test]
fn call_return_symmetry() {
    // Caller holds one local; the call site pairs CALL 1 with POP_FRAME 1.
    let mut asm = Asm::new();
    asm.op(op::set_local_signed(0, 1))
        .op(op::call_code(0, 1, 1))
        .op(op::pop_frame(1))
        .op(op::ret());
    let callee = asm.here() as u32;
    asm.op(op::set_local_signed(0, 99)).op(op::ret());

    let mut vm = boot(asm, vec![0, callee]);
    let exit = vm.run(0).expect("call/return");

    let root = StackObject::from_ref(exit.current_stack).frames(vm.memory());
    assert_eq!(vm.stack_pointer(), root, "sp restored to the root frame");
    assert_eq!(local(&vm, 0), 1, "caller slots survive the call");

    // The callee frame sat one caller-frame size above and is still there.
    let callee_frame = Frame::at(root + Frame::bytes(1));
    assert_eq!(callee_frame.slot(vm.memory(), 0), 99);
    assert_eq!(
        callee_frame.return_pc(vm.memory()),
        4 * 4,
        "return pc addresses the POP_FRAME after the call site"
    );
}

#[test]
fn tail_call_is_call_pop_return() {
    // Both callees store 42 to global 0 and leave sp at the root frame.
    let build_callee = |asm: &mut Asm| {
        asm.op(op::set_local_global(1, 0))
            .op(op::set_local_signed(2, 42))
            .op(op::store8(1, 2, 0))
            .op(op::ret());
    };

    let mut plain = Asm::new();
    plain
        .op(op::call_code(0, 2, 1))
        .op(op::pop_frame(2))
        .op(op::ret());
    let callee = plain.here() as u32;
    build_callee(&mut plain);

    let mut tail = Asm::new();
    tail.op(op::tail_call_code(0, 2, 1));
    let tail_callee = tail.here() as u32;
    build_callee(&mut tail);

    for (asm, offsets) in [(plain, vec![0, callee]), (tail, vec![0, tail_callee])] {
        let mut program = common::program(asm, offsets);
        program.global_offsets = vec![0];

        let mut vm = Interpreter::new(program, VmMemory::new(), GrowHost::new());
        let exit = vm.run(0).expect("tail-call equivalence");

        let g0 = vm.memory().map().globals;
        assert_eq!(vm.memory().read_u64(g0), 42);
        let root = StackObject::from_ref(exit.current_stack).frames(vm.memory());
        assert_eq!(vm.stack_pointer(), root);
    }
}

#[test]
fn closure_calls_read_the_code_field() {
    // Closure object: type word, captured-slot count, function id. The
    // payload fields sit at ref + 7 and ref + 15.
    let mut asm = Asm::new();
    asm.op(op::alloc(0, value::FN_TYPE as usize, 16))
        .op(op::set_local_signed(1, 0))
        .op(op::store8(0, 1, 7))
        .op(op::set_local_signed(2, 1)) // function id 1
        .op(op::store8(0, 2, 15))
        .op(op::call_closure(0, 3, 0))
        .op(op::pop_frame(3))
        .op(op::ret());
    let callee = asm.here() as u32;
    asm.op(op::set_local_global(0, 0))
        .op(op::set_local_signed(1, 55))
        .op(op::store8(0, 1, 0))
        .op(op::ret());

    let mut program = common::program(asm, vec![0, callee]);
    program.global_offsets = vec![0];

    let mut vm = Interpreter::new(program, VmMemory::new(), GrowHost::new());
    vm.run(0).expect("closure call");

    let g0 = vm.memory().map().globals;
    assert_eq!(vm.memory().read_u64(g0), 55);
    assert_eq!(local(&vm, 2), 1, "caller frame untouched");
}

#[test]
fn goto_is_relative_to_the_instruction() {
    let mut asm = Asm::new();
    asm.op(op::goto(3))
        .op(op::set_local_signed(0, 1)) // skipped
        .op(op::set_local_signed(0, 7))
        .op(op::ret());

    let mut vm = boot(asm, vec![0]);
    vm.run(0).expect("goto");

    assert_eq!(local(&vm, 0), 7);
}

#[test]
fn jump_set_branches_on_truthiness() {
    for (cond, expect) in [(value::boolref(true), 21), (value::boolref(false), 22)] {
        let mut asm = Asm::new();
        asm.op(op::set_local_wide(0, cond))
            .op(op::jump_set(0, 2, 5)); // taken: word 5, else: word 8
        asm.op(op::set_local_signed(1, 21)).op(op::ret());
        asm.op(op::set_local_signed(1, 22)).op(op::ret());

        let mut vm = boot(asm, vec![0]);
        vm.run(0).expect("jump set");

        assert_eq!(local(&vm, 1) as i64, expect);
    }
}

#[test]
fn jump_reg_compares_a_machine_register() {
    for (expected, skipped) in [(9usize, true), (8usize, false)] {
        let mut asm = Asm::new();
        asm.op(op::set_reg_unsigned(5, 9))
            .op(op::jump_reg(5, expected, 4))
            .op(op::set_local_signed(0, 111))
            .op(op::set_local_signed(1, 222))
            .op(op::ret());

        let mut vm = boot(asm, vec![0]);
        vm.run(0).expect("jump reg");

        let fall_through = local(&vm, 0) as i64;
        assert_eq!(fall_through, if skipped { 0 } else { 111 });
        assert_eq!(local(&vm, 1) as i64, 222);
    }
}

#[test]
fn dispatch_branches_through_the_oracle() {
    let mut asm = Asm::new();
    asm.op(op::dispatch(3, &[99, 5, 99])); // words 0..=4
    asm.op(op::set_local_signed(0, 31)).op(op::ret()); // word 5

    let mut vm = boot_host(asm, vec![0], TestHost::new(1));
    vm.run(0).expect("dispatch");

    assert_eq!(local(&vm, 0) as i64, 31);
}

#[test]
fn dispatch_method_calls_past_the_branch_targets() {
    // Oracle answers 5 over a 3-target table: function id 5 - 2 = 3.
    let mut asm = Asm::new();
    asm.op(op::dispatch_method(3, &[99, 99, 99]));
    asm.op(op::ret());
    let f3 = asm.here() as u32;
    asm.op(op::set_local_signed(0, 77)).op(op::ret());

    let mut vm = boot_host(asm, vec![0, 6, 6, f3], TestHost::new(5));
    vm.run(0).expect("dispatch method");

    assert_eq!(local(&vm, 0) as i64, 77);
    assert_eq!(vm.program().code_offset(3), Some(f3 as Word * 4));
}

#[test]
fn dispatch_rejects_an_out_of_table_index() {
    let mut asm = Asm::new();
    asm.op(op::dispatch(0, &[2, 2, 2]));
    asm.op(op::ret());

    let mut vm = boot_host(asm, vec![0], TestHost::new(9));
    let err = vm.run(0).unwrap_err();

    assert!(matches!(
        err,
        VmError::DispatchTarget {
            index: 9,
            count: 3,
            ..
        }
    ));
}

#[test]
fn type_of_stores_the_oracle_answer() {
    let mut asm = Asm::new();
    asm.op(op::type_of(0, 12)).op(op::ret());

    let mut vm = boot_host(asm, vec![0], TestHost::new(7));
    vm.run(0).expect("typeof");

    assert_eq!(local(&vm, 0), 7);
}

#[test]
fn c_call_marshals_through_registers() {
    let mut asm = Asm::new();
    asm.op(op::set_reg_unsigned(1, 5))
        .op(op::set_reg_unsigned(2, 7))
        .op(op::c_call_extern(3, 1, 0))
        .op(op::get_reg(0, 3))
        .op(op::ret());

    let mut program = common::program(asm, vec![0]);
    program.extern_table = vec![0xbeef];

    let mut vm = Interpreter::new(program, VmMemory::new(), TestHost::new(0));
    vm.run(0).expect("c call");

    assert_eq!(local(&vm, 0), 12);
    assert_eq!(vm.host().c_calls, vec![(3, 0xbeef)]);
}

#[test]
fn trace_hands_the_stack_to_the_host() {
    let mut asm = Asm::new();
    asm.op(op::current_stack(0)).op(op::trace(0)).op(op::ret());

    let mut vm = boot_host(asm, vec![0], TestHost::new(0));
    let exit = vm.run(0).expect("trace");

    assert_eq!(vm.host().traces, vec![exit.current_stack]);
}

#[test]
fn invalid_opcode_is_fatal() {
    let mut vm = boot(
        {
            let mut asm = Asm::new();
            asm.op([0xee_u32]);
            asm
        },
        vec![0],
    );

    let err = vm.run(0).unwrap_err();
    assert!(matches!(
        err,
        VmError::InvalidOpcode {
            opcode: 0xee,
            pc: 0
        }
    ));
}

#[test]
fn removed_opcodes_are_fatal() {
    for opcode in [
        Opcode::CALLX,
        Opcode::TCALLX,
        Opcode::CCALLI,
        Opcode::ASHRB,
        Opcode::GLOBALS,
    ] {
        let mut asm = Asm::new();
        asm.op(pack::c(opcode, 0, 0, 0));

        let mut vm = boot(asm, vec![0]);
        let err = vm.run(0).unwrap_err();

        assert!(
            matches!(err, VmError::RemovedOpcode { opcode: o, pc: 0 } if o == opcode),
            "{opcode:?}"
        );
    }
}

#[test]
fn unknown_function_id_is_reported() {
    let mut asm = Asm::new();
    asm.op(op::call_code(0, 0, 9)).op(op::ret());

    let mut vm = boot(asm, vec![0]);
    assert!(matches!(
        vm.run(0).unwrap_err(),
        VmError::UnknownFunction { fid: 9 }
    ));
}
