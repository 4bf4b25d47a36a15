// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use static_assertions::const_assert;

/// Registers, memory cells and operands are all one byte wide.
pub type Word = u8;

/// Index into memory. Wider than [`Word`] so that running off the end of
/// memory is reported instead of silently wrapping back to zero.
pub type Address = usize;

/// Operand byte naming one of the general-purpose registers.
pub type RegisterIndex = u8;

pub const MEMORY_SIZE: usize = 256;
const_assert!(MEMORY_SIZE <= 1usize << Word::BITS);

pub const REGISTER_COUNT: usize = 8;

/// `R7` holds the address of the top of the stack.
pub const STACK_POINTER: RegisterIndex = 7;
const_assert!((STACK_POINTER as usize) < REGISTER_COUNT);

/// Initial stack pointer. The stack grows down from here.
pub const STACK_BASE: Word = 0xF4;
const_assert!((STACK_BASE as usize) < MEMORY_SIZE);

/// The top two bits of an opcode count the operand bytes that follow it.
pub const OPERAND_COUNT_SHIFT: u32 = 6;
const_assert!(OPERAND_COUNT_SHIFT < Word::BITS);

pub const MAX_OPERANDS: usize = 2;
const_assert!(MAX_OPERANDS < 1 << (Word::BITS - OPERAND_COUNT_SHIFT));
