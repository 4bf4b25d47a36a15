// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use crate::{
    arch::{Address, Word, MEMORY_SIZE},
    error::{Location, VMError, VMResult},
};

/// Flat, byte-addressed RAM. Program code sits at the bottom and the stack
/// grows down from near the top.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    cells: [Word; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            cells: [0; MEMORY_SIZE],
        }
    }
}

impl Memory {
    pub fn read(&self, address: Address) -> VMResult<Word> {
        self.cells
            .get(address)
            .copied()
            .ok_or(VMError::AddressOutOfRange(Location::Memory(address)))
    }

    pub fn write(&mut self, address: Address, value: Word) -> VMResult {
        let cell = self
            .cells
            .get_mut(address)
            .ok_or(VMError::AddressOutOfRange(Location::Memory(address)))?;
        *cell = value;
        Ok(())
    }

    /// Like [`Memory::read`], for callers that only observe the machine and
    /// must not fault.
    pub fn peek(&self, address: Address) -> Option<Word> {
        self.cells.get(address).copied()
    }

    /// Copies `image` in starting at address zero and clears everything
    /// above it.
    pub fn load(&mut self, image: &[Word]) -> VMResult {
        if image.len() > MEMORY_SIZE {
            return Err(VMError::ProgramTooLarge { size: image.len() });
        }
        self.cells[..image.len()].copy_from_slice(image);
        self.cells[image.len()..].fill(0);
        Ok(())
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.cells
    }
}
