// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use proptest::prelude::*;

use super::{Snapshot, State, VM};
use crate::{
    arch::{Word, MEMORY_SIZE, STACK_BASE},
    config::Config,
    error::{Location, VMError, VMResult},
    op::Op,
    program::{Listing, Program},
};

fn vm_with(ops: &[Op]) -> VM<Vec<u8>> {
    let program = Program::assemble(ops).expect("program should fit");
    let mut vm = VM::new(vec![]);
    vm.load_program(&program).expect("program should load");
    vm
}

fn run(ops: &[Op]) -> (VM<Vec<u8>>, VMResult) {
    let mut vm = vm_with(ops);
    let result = vm.run();
    (vm, result)
}

fn printed(vm: &VM<Vec<u8>>) -> String {
    String::from_utf8(vm.output().clone()).expect("output should be utf-8")
}

#[test]
fn basic_program() {
    let mut vm = VM::new(vec![]);
    vm.load(&[
        0b1000_0010, 0, 8, // LDI R0, 8
        0b1000_0010, 1, 9, // LDI R1, 9
        0b1010_0000, 0, 1, // ADD R0, R1
        0b0100_0111, 0, // PRN R0
        0b0000_0001, // HLT
    ])
    .expect("program should load");

    vm.run().expect("program should run without errors");

    assert_eq!("17\n", printed(&vm));
    assert_eq!(State::Halted, vm.state());
    assert_eq!(11, vm.pc());
    assert_eq!(5, vm.steps());
}

#[test]
fn unrecognized_opcode_halts() {
    let (vm, result) = run(&[Op::Ldi(0, 1), Op::Prn(0)]);
    // the image ends in zeroed memory, and 0 is not an opcode
    assert!(matches!(
        result,
        Err(VMError::UnrecognizedOpcode {
            opcode: 0,
            address: 5
        })
    ));
    assert_eq!(State::Halted, vm.state());

    let mut vm = VM::new(vec![]);
    vm.load(&[0b0100_0111, 0, 0xFF, 0b0100_0111, 0, 0b0000_0001])
        .unwrap();
    assert!(matches!(
        vm.run(),
        Err(VMError::UnrecognizedOpcode {
            opcode: 0xFF,
            address: 2
        })
    ));
    assert_eq!("0\n", printed(&vm));
}

#[test]
fn halted_machine_does_not_step() {
    let (mut vm, result) = run(&[Op::Hlt, Op::Ldi(0, 1)]);
    result.expect("program should run without errors");
    assert_eq!(State::Halted, vm.step().unwrap());
    assert_eq!(0, vm.register(0).unwrap());
    assert_eq!(1, vm.steps());
}

#[test]
fn faulted_machine_stays_halted() {
    let (mut vm, result) = run(&[Op::Ldi(8, 1), Op::Hlt]);
    assert!(matches!(
        result,
        Err(VMError::AddressOutOfRange(Location::Register(8)))
    ));
    assert_eq!(State::Halted, vm.step().unwrap());
    assert_eq!(0, vm.pc());
}

#[test]
fn arithmetic_wraps() {
    let (vm, result) = run(&[
        Op::Ldi(0, 200),
        Op::Ldi(1, 100),
        Op::Add(0, 1),
        Op::Prn(0),
        Op::Ldi(2, 16),
        Op::Ldi(3, 17),
        Op::Mul(2, 3),
        Op::Prn(2),
        Op::Hlt,
    ]);
    result.expect("program should run without errors");
    assert_eq!("44\n16\n", printed(&vm));
}

#[test]
fn modulo_by_zero_faults() {
    let (vm, result) = run(&[
        Op::Ldi(0, 17),
        Op::Ldi(1, 5),
        Op::Mod(0, 1),
        Op::Prn(0),
        Op::Ldi(1, 0),
        Op::Mod(0, 1),
        Op::Prn(0),
        Op::Hlt,
    ]);
    assert!(matches!(result, Err(VMError::DivisionByZero)));
    assert_eq!("2\n", printed(&vm));
}

#[test]
fn bitwise_ops() {
    let (vm, result) = run(&[
        Op::Ldi(0, 0b1100),
        Op::Ldi(1, 0b0110),
        Op::Or(0, 1),
        Op::Prn(0), // 14
        Op::Xor(0, 1),
        Op::Prn(0), // 8
        Op::Not(0),
        Op::Prn(0), // 247
        Op::Ldi(2, 2),
        Op::Shr(0, 2),
        Op::Prn(0), // 61
        Op::Shl(0, 2),
        Op::Prn(0), // 244
        Op::Hlt,
    ]);
    result.expect("program should run without errors");
    assert_eq!("14\n8\n247\n61\n244\n", printed(&vm));
}

#[test]
fn not_takes_one_operand() {
    let mut vm = vm_with(&[Op::Ldi(3, 0), Op::Not(3), Op::Hlt]);
    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(5, vm.pc());
    assert_eq!(0xFF, vm.register(3).unwrap());
}

#[test]
fn push_pop() {
    let (vm, result) = run(&[
        Op::Ldi(0, 1),
        Op::Ldi(1, 2),
        Op::Push(0),
        Op::Push(1),
        Op::Pop(0),
        Op::Pop(1),
        Op::Prn(0),
        Op::Prn(1),
        Op::Hlt,
    ]);
    result.expect("program should run without errors");
    assert_eq!("2\n1\n", printed(&vm));
    assert_eq!(STACK_BASE, vm.registers().stack_pointer());
    assert_eq!(1, vm.memory().read(STACK_BASE as usize - 1).unwrap());
}

#[test]
fn call_return() {
    // 0: LDI R1, 8   3: CALL R1   5: PRN R0   7: HLT   8: LDI R0, 42   11: RET
    let mut vm = vm_with(&[
        Op::Ldi(1, 8),
        Op::Call(1),
        Op::Prn(0),
        Op::Hlt,
        Op::Ldi(0, 42),
        Op::Ret,
    ]);

    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(8, vm.pc());
    assert_eq!(STACK_BASE - 1, vm.registers().stack_pointer());
    assert_eq!(5, vm.memory().read(STACK_BASE as usize - 1).unwrap());

    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(5, vm.pc());
    assert_eq!(STACK_BASE, vm.registers().stack_pointer());

    vm.run().expect("program should run without errors");
    assert_eq!("42\n", printed(&vm));
}

#[test]
fn nested_calls() {
    // main at 0 calls double (18), which calls add (14) to compute R0 * 2
    let ops = [
        Op::Ldi(0, 3),
        Op::Ldi(2, 18),
        Op::Ldi(3, 14),
        Op::Call(2),
        Op::Prn(0),
        Op::Hlt,
        // add
        Op::Add(0, 1),
        Op::Ret,
        // double
        Op::Ldi(1, 0),
        Op::Add(1, 0),
        Op::Call(3),
        Op::Ret,
    ];
    let listing = Program::assemble(&ops).unwrap().disassemble();
    assert_eq!(14, addr_of(&listing, 6));
    assert_eq!(18, addr_of(&listing, 8));

    let (vm, result) = run(&ops);
    result.expect("program should run without errors");
    assert_eq!("6\n", printed(&vm));
    assert_eq!(STACK_BASE, vm.registers().stack_pointer());
}

fn addr_of(listing: &[Listing], index: usize) -> usize {
    match listing[index] {
        Listing::Instruction { address, .. } | Listing::Data { address, .. } => {
            address
        }
    }
}

#[test]
fn conditional_loop() {
    // counts to 5: 9: ADD R0, R1   12: PRN R0   14: CMP R0, R2   17: JNE R3
    let (vm, result) = run(&[
        Op::Ldi(1, 1),
        Op::Ldi(2, 5),
        Op::Ldi(3, 9),
        Op::Add(0, 1),
        Op::Prn(0),
        Op::Cmp(0, 2),
        Op::Jne(3),
        Op::Hlt,
    ]);
    result.expect("program should run without errors");
    assert_eq!("1\n2\n3\n4\n5\n", printed(&vm));
    assert!(vm.flags().is_equal());
}

#[test]
fn jumps_before_any_compare() {
    // flags start clear, so JEQ falls through and JNE is taken
    // 0: LDI R0, 10  3: JEQ R0  5: LDI R1, 1  8: JNE R0  10: HLT
    let (vm, result) = run(&[
        Op::Ldi(0, 10),
        Op::Jeq(0),
        Op::Ldi(1, 1),
        Op::Jne(0),
        Op::Hlt,
    ]);
    result.expect("program should run without errors");
    assert_eq!(1, vm.register(1).unwrap());
    assert_eq!(10, vm.pc());
}

#[test]
fn unconditional_jump() {
    // 0: LDI R0, 7   3: JMP R0   5: PRN R0   7: HLT
    let (vm, result) = run(&[Op::Ldi(0, 7), Op::Jmp(0), Op::Prn(0), Op::Hlt]);
    result.expect("program should run without errors");
    assert_eq!("", printed(&vm));
}

#[test]
fn stack_overflow_faults() {
    let (_, result) = run(&[Op::Ldi(7, 0), Op::Push(0), Op::Hlt]);
    assert!(matches!(result, Err(VMError::StackOverflow)));
}

#[test]
fn stack_underflow_faults() {
    let (vm, result) = run(&[Op::Ldi(7, 255), Op::Pop(0), Op::Hlt]);
    assert!(matches!(result, Err(VMError::StackUnderflow)));
    assert_eq!(255, vm.registers().stack_pointer());

    let (_, result) = run(&[Op::Ldi(7, 255), Op::Ret]);
    assert!(matches!(result, Err(VMError::StackUnderflow)));
}

#[test]
fn running_off_the_end_of_memory_faults() {
    let mut image = vec![0; MEMORY_SIZE];
    let mut prefix = vec![];
    Op::Ldi(0, 255).encode_into(&mut prefix);
    Op::Jmp(0).encode_into(&mut prefix);
    image[..prefix.len()].copy_from_slice(&prefix);
    // an LDI with no room left for its operands
    image[255] = Op::LDI_TAG;

    let mut vm = VM::new(vec![]);
    vm.load(&image).unwrap();
    assert!(matches!(
        vm.run(),
        Err(VMError::AddressOutOfRange(Location::Memory(256)))
    ));
}

#[test]
fn step_limit_stops_infinite_loops() {
    let mut vm = vm_with(&[Op::Ldi(0, 0), Op::Jmp(0)])
        .with_config(Config::default().with_step_limit(Some(10)));
    assert!(matches!(vm.run(), Err(VMError::StepLimitExceeded(10))));
    assert_eq!(10, vm.steps());
}

#[test]
fn load_resets_machine() {
    let (mut vm, result) = run(&[Op::Ldi(0, 5), Op::Push(0), Op::Hlt]);
    result.expect("program should run without errors");

    vm.load(&[Op::HLT_TAG]).unwrap();
    assert_eq!(State::Running, vm.state());
    assert_eq!(0, vm.pc());
    assert_eq!(0, vm.register(0).unwrap());
    assert_eq!(STACK_BASE, vm.registers().stack_pointer());
    assert_eq!(0, vm.memory().read(STACK_BASE as usize - 1).unwrap());
}

#[test]
fn snapshot_formats_like_trace() {
    let vm = vm_with(&[Op::Ldi(0, 8), Op::Hlt]);
    assert_eq!(
        "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4",
        vm.snapshot().to_string()
    );

    let snapshot = Snapshot {
        pc: 0xFE,
        upcoming: [Some(0x01), Some(0xAB), None],
        registers: [1, 2, 3, 4, 5, 6, 7, 0xF4],
    };
    assert_eq!(
        "TRACE: FE | 01 AB -- | 01 02 03 04 05 06 07 F4",
        snapshot.to_string()
    );
}

/// LDI R0, a; LDI R1, b; LDI R2, 18; CMP R0, R1; <jump> R2; LDI R3, 1; HLT;
/// 18: LDI R3, 2; HLT. Returns R3: 2 if the jump was taken.
fn branch_outcome(a: Word, b: Word, jump: fn(u8) -> Op) -> Word {
    let (vm, result) = run(&[
        Op::Ldi(0, a),
        Op::Ldi(1, b),
        Op::Ldi(2, 18),
        Op::Cmp(0, 1),
        jump(2),
        Op::Ldi(3, 1),
        Op::Hlt,
        Op::Ldi(3, 2),
        Op::Hlt,
    ]);
    result.expect("program should run without errors");
    vm.register(3).unwrap()
}

proptest! {
    #[test]
    fn ldi_then_prn_prints_value(value in any::<Word>(), register in 0u8..8) {
        let (vm, result) = run(&[Op::Ldi(register, value), Op::Prn(register), Op::Hlt]);
        prop_assert!(result.is_ok());
        prop_assert_eq!(format!("{value}\n"), printed(&vm));
    }

    #[test]
    fn jeq_jumps_only_when_equal(a in any::<Word>(), b in any::<Word>()) {
        let taken = branch_outcome(a, b, Op::Jeq) == 2;
        prop_assert_eq!(a == b, taken);
    }

    #[test]
    fn jne_jumps_only_when_not_equal(a in any::<Word>(), b in any::<Word>()) {
        let taken = branch_outcome(a, b, Op::Jne) == 2;
        prop_assert_eq!(a != b, taken);
    }

    #[test]
    fn push_then_pop_restores_value_and_stack_pointer(
        value in any::<Word>(),
        from in 0u8..7,
        to in 0u8..7,
    ) {
        let (vm, result) = run(&[
            Op::Ldi(from, value),
            Op::Push(from),
            Op::Pop(to),
            Op::Hlt,
        ]);
        prop_assert!(result.is_ok());
        prop_assert_eq!(value, vm.register(to).unwrap());
        prop_assert_eq!(STACK_BASE, vm.registers().stack_pointer());
    }
}
