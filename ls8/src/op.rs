// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::fmt;

use enum_tags::enum_tags;

use crate::arch::{RegisterIndex, Word, MAX_OPERANDS, OPERAND_COUNT_SHIFT};

/// Smallest sized integer type that can fit an op code.
pub type RawOpCode = Word;

/// An LS-8 instruction. Each discriminant is the opcode byte; the operands
/// follow it in memory in field order.
///
/// Opcode layout is `AABCDDDD`: `AA` is the operand count, `B` marks ALU
/// operations, `C` marks instructions that set the program counter and
/// `DDDD` identifies the instruction within its group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
#[enum_tags(public, repr(RawOpCode))]
pub enum Op {
    /// `Self::Hlt` stops the machine.
    Hlt = 0b0000_0001,
    /// `Self::Ldi(r, i)` loads the immediate `i` into `r`.
    Ldi(RegisterIndex, Word) = 0b1000_0010,
    /// `Self::Prn(r)` prints the value of `r` in decimal.
    Prn(RegisterIndex) = 0b0100_0111,
    Add(RegisterIndex, RegisterIndex) = 0b1010_0000,
    Mul(RegisterIndex, RegisterIndex) = 0b1010_0010,
    Mod(RegisterIndex, RegisterIndex) = 0b1010_0100,
    /// `Self::Cmp(a, b)` compares `a` with `b` and only writes the flags.
    Cmp(RegisterIndex, RegisterIndex) = 0b1010_0111,
    Or(RegisterIndex, RegisterIndex) = 0b1010_1010,
    Xor(RegisterIndex, RegisterIndex) = 0b1010_1011,
    Not(RegisterIndex) = 0b0110_1001,
    Shl(RegisterIndex, RegisterIndex) = 0b1010_1100,
    Shr(RegisterIndex, RegisterIndex) = 0b1010_1101,
    Push(RegisterIndex) = 0b0100_0101,
    Pop(RegisterIndex) = 0b0100_0110,
    /// `Self::Call(r)` pushes the address of the next instruction and jumps
    /// to the address held in `r`.
    Call(RegisterIndex) = 0b0101_0000,
    /// `Self::Ret` pops the return address pushed by [`Op::Call`].
    Ret = 0b0001_0001,
    Jmp(RegisterIndex) = 0b0101_0100,
    /// `Self::Jeq(r)` jumps to the address in `r` if the equal flag is set.
    Jeq(RegisterIndex) = 0b0101_0101,
    /// `Self::Jne(r)` jumps to the address in `r` if the equal flag is clear.
    Jne(RegisterIndex) = 0b0101_0110,
}

impl Op {
    pub const fn opcode(&self) -> RawOpCode {
        self.tag()
    }

    /// Number of operand bytes following `opcode`, read from its top bits.
    pub const fn operand_count_of(opcode: RawOpCode) -> usize {
        (opcode >> OPERAND_COUNT_SHIFT) as usize
    }

    /// Size of this instruction in memory, opcode included.
    pub const fn encoded_len(&self) -> usize {
        1 + Self::operand_count_of(self.opcode())
    }

    pub fn encode_into(&self, stream: &mut Vec<Word>) {
        stream.push(self.opcode());
        match *self {
            Self::Hlt | Self::Ret => {}
            Self::Prn(a)
            | Self::Not(a)
            | Self::Push(a)
            | Self::Pop(a)
            | Self::Call(a)
            | Self::Jmp(a)
            | Self::Jeq(a)
            | Self::Jne(a) => stream.push(a),
            Self::Ldi(a, b)
            | Self::Add(a, b)
            | Self::Mul(a, b)
            | Self::Mod(a, b)
            | Self::Cmp(a, b)
            | Self::Or(a, b)
            | Self::Xor(a, b)
            | Self::Shl(a, b)
            | Self::Shr(a, b) => stream.extend([a, b]),
        }
    }

    /// Decodes the instruction at the start of `stream`, returning it with
    /// its length. Fails on unknown opcodes and on operands cut off by the
    /// end of the stream.
    pub fn decode_from(stream: &[Word]) -> Option<(Self, usize)> {
        let (&opcode, rest) = stream.split_first()?;
        let count = Self::operand_count_of(opcode);
        if count > MAX_OPERANDS || rest.len() < count {
            return None;
        }
        let a = rest.first().copied().unwrap_or_default();
        let b = rest.get(1).copied().unwrap_or_default();

        let op = match opcode {
            Self::HLT_TAG => Self::Hlt,
            Self::LDI_TAG => Self::Ldi(a, b),
            Self::PRN_TAG => Self::Prn(a),
            Self::ADD_TAG => Self::Add(a, b),
            Self::MUL_TAG => Self::Mul(a, b),
            Self::MOD_TAG => Self::Mod(a, b),
            Self::CMP_TAG => Self::Cmp(a, b),
            Self::OR_TAG => Self::Or(a, b),
            Self::XOR_TAG => Self::Xor(a, b),
            Self::NOT_TAG => Self::Not(a),
            Self::SHL_TAG => Self::Shl(a, b),
            Self::SHR_TAG => Self::Shr(a, b),
            Self::PUSH_TAG => Self::Push(a),
            Self::POP_TAG => Self::Pop(a),
            Self::CALL_TAG => Self::Call(a),
            Self::RET_TAG => Self::Ret,
            Self::JMP_TAG => Self::Jmp(a),
            Self::JEQ_TAG => Self::Jeq(a),
            Self::JNE_TAG => Self::Jne(a),
            _ => return None,
        };
        Some((op, 1 + count))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.mnemonic();
        match *self {
            Self::Hlt | Self::Ret => write!(f, "{mnemonic}"),
            Self::Ldi(a, i) => write!(f, "{mnemonic} R{a}, {i}"),
            Self::Prn(a)
            | Self::Not(a)
            | Self::Push(a)
            | Self::Pop(a)
            | Self::Call(a)
            | Self::Jmp(a)
            | Self::Jeq(a)
            | Self::Jne(a) => write!(f, "{mnemonic} R{a}"),
            Self::Add(a, b)
            | Self::Mul(a, b)
            | Self::Mod(a, b)
            | Self::Cmp(a, b)
            | Self::Or(a, b)
            | Self::Xor(a, b)
            | Self::Shl(a, b)
            | Self::Shr(a, b) => write!(f, "{mnemonic} R{a}, R{b}"),
        }
    }
}
