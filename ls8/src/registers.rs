// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::cmp::Ordering;

use crate::{
    arch::{RegisterIndex, Word, REGISTER_COUNT, STACK_BASE, STACK_POINTER},
    error::{Location, VMError, VMResult},
};

/// The eight general-purpose registers. `R7` doubles as the stack pointer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RegisterFile {
    slots: [Word; REGISTER_COUNT],
}

impl Default for RegisterFile {
    fn default() -> Self {
        let mut slots = [0; REGISTER_COUNT];
        slots[STACK_POINTER as usize] = STACK_BASE;
        Self { slots }
    }
}

impl RegisterFile {
    pub fn get(&self, index: RegisterIndex) -> VMResult<Word> {
        self.slots
            .get(index as usize)
            .copied()
            .ok_or(VMError::AddressOutOfRange(Location::Register(index)))
    }

    pub fn set(&mut self, index: RegisterIndex, value: Word) -> VMResult {
        let slot = self
            .slots
            .get_mut(index as usize)
            .ok_or(VMError::AddressOutOfRange(Location::Register(index)))?;
        *slot = value;
        Ok(())
    }

    pub fn stack_pointer(&self) -> Word {
        self.slots[STACK_POINTER as usize]
    }

    pub fn set_stack_pointer(&mut self, value: Word) {
        self.slots[STACK_POINTER as usize] = value;
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.slots
    }
}

/// Condition codes written by `CMP`. Exactly one bit is set after a
/// comparison; before the first one the byte is zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags(Word);

impl Flags {
    pub const EQUAL: Word = 0b001;
    pub const GREATER: Word = 0b010;
    pub const LESS: Word = 0b100;

    pub const fn from_ordering(ordering: Ordering) -> Self {
        Self(match ordering {
            Ordering::Equal => Self::EQUAL,
            Ordering::Greater => Self::GREATER,
            Ordering::Less => Self::LESS,
        })
    }

    pub const fn bits(self) -> Word {
        self.0
    }

    pub const fn is_equal(self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    pub const fn is_greater(self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub const fn is_less(self) -> bool {
        self.0 & Self::LESS != 0
    }
}
