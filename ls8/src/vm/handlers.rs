// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::io::Write;

use super::{Flow, Operands, VM};
use crate::{
    alu::{self, AluOp},
    arch::{Address, RegisterIndex, Word},
    error::{Location, VMError, VMResult},
};

impl<W: Write> VM<W> {
    pub(super) fn exec_hlt(&mut self, _: Operands) -> VMResult<Flow> {
        Ok(Flow::Halt)
    }

    pub(super) fn exec_ldi(&mut self, operands: Operands) -> VMResult<Flow> {
        self.registers.set(operands.a, operands.b)?;
        Ok(Flow::Advance)
    }

    pub(super) fn exec_prn(&mut self, operands: Operands) -> VMResult<Flow> {
        let value = self.registers.get(operands.a)?;
        writeln!(self.output, "{value}")?;
        Ok(Flow::Advance)
    }

    pub(super) fn exec_add(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Add, operands)
    }

    pub(super) fn exec_mul(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Mul, operands)
    }

    pub(super) fn exec_mod(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Mod, operands)
    }

    pub(super) fn exec_or(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Or, operands)
    }

    pub(super) fn exec_xor(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Xor, operands)
    }

    pub(super) fn exec_not(&mut self, operands: Operands) -> VMResult<Flow> {
        // single operand: complement in place
        self.alu(
            AluOp::Not,
            Operands {
                a: operands.a,
                b: operands.a,
            },
        )
    }

    pub(super) fn exec_shl(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Shl, operands)
    }

    pub(super) fn exec_shr(&mut self, operands: Operands) -> VMResult<Flow> {
        self.alu(AluOp::Shr, operands)
    }

    pub(super) fn exec_cmp(&mut self, operands: Operands) -> VMResult<Flow> {
        let first = self.registers.get(operands.a)?;
        let second = self.registers.get(operands.b)?;
        self.flags = alu::compare(first, second);
        Ok(Flow::Advance)
    }

    pub(super) fn exec_push(&mut self, operands: Operands) -> VMResult<Flow> {
        let value = self.registers.get(operands.a)?;
        self.push(value)?;
        Ok(Flow::Advance)
    }

    pub(super) fn exec_pop(&mut self, operands: Operands) -> VMResult<Flow> {
        let value = self.pop()?;
        self.registers.set(operands.a, value)?;
        Ok(Flow::Advance)
    }

    pub(super) fn exec_call(&mut self, operands: Operands) -> VMResult<Flow> {
        let target = self.registers.get(operands.a)?;

        // CALL is two bytes long
        let return_address = self.pc + 2;
        let return_address = Word::try_from(return_address).map_err(|_| {
            VMError::AddressOutOfRange(Location::Memory(return_address))
        })?;
        self.push(return_address)?;

        self.pc = target as Address;
        Ok(Flow::Jumped)
    }

    pub(super) fn exec_ret(&mut self, _: Operands) -> VMResult<Flow> {
        self.pc = self.pop()? as Address;
        Ok(Flow::Jumped)
    }

    pub(super) fn exec_jmp(&mut self, operands: Operands) -> VMResult<Flow> {
        self.jump_to_register(operands.a)
    }

    pub(super) fn exec_jeq(&mut self, operands: Operands) -> VMResult<Flow> {
        if self.flags.is_equal() {
            self.jump_to_register(operands.a)
        } else {
            Ok(Flow::Advance)
        }
    }

    pub(super) fn exec_jne(&mut self, operands: Operands) -> VMResult<Flow> {
        if self.flags.is_equal() {
            Ok(Flow::Advance)
        } else {
            self.jump_to_register(operands.a)
        }
    }

    /// Applies `op` to registers `a` and `b`, storing the result in `a`.
    fn alu(&mut self, op: AluOp, operands: Operands) -> VMResult<Flow> {
        let first = self.registers.get(operands.a)?;
        let second = self.registers.get(operands.b)?;
        let result = alu::compute(op, first, second)?;
        self.registers.set(operands.a, result)?;
        Ok(Flow::Advance)
    }

    fn jump_to_register(&mut self, register: RegisterIndex) -> VMResult<Flow> {
        self.pc = self.registers.get(register)? as Address;
        Ok(Flow::Jumped)
    }

    fn push(&mut self, value: Word) -> VMResult {
        let stack_pointer = self
            .registers
            .stack_pointer()
            .checked_sub(1)
            .ok_or(VMError::StackOverflow)?;
        self.memory.write(stack_pointer as Address, value)?;
        self.registers.set_stack_pointer(stack_pointer);
        Ok(())
    }

    fn pop(&mut self) -> VMResult<Word> {
        let stack_pointer = self.registers.stack_pointer();
        let value = self.memory.read(stack_pointer as Address)?;
        let stack_pointer =
            stack_pointer.checked_add(1).ok_or(VMError::StackUnderflow)?;
        self.registers.set_stack_pointer(stack_pointer);
        Ok(value)
    }
}
