// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::arch::{Address, RegisterIndex, Word};

/// Where an out-of-range access landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Memory(Address),
    Register(RegisterIndex),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(address) => write!(f, "memory address {address:#04x}"),
            Self::Register(index) => write!(f, "register R{index}"),
        }
    }
}

/// Faults that stop the machine. None of them are recoverable: the
/// machine halts and the fault is handed back to the caller.
#[derive(Debug, Error)]
pub enum VMError {
    #[error("unrecognized opcode {opcode:#010b} at address {address:#04x}")]
    UnrecognizedOpcode { opcode: Word, address: Address },
    #[error("division by zero")]
    DivisionByZero,
    #[error("access out of range: {0}")]
    AddressOutOfRange(Location),
    #[error("stack overflow: stack pointer would drop below address 0")]
    StackOverflow,
    #[error("stack underflow: stack pointer would pass the end of memory")]
    StackUnderflow,
    #[error("program of {size} bytes does not fit in memory")]
    ProgramTooLarge { size: usize },
    #[error("step limit of {0} reached before the program halted")]
    StepLimitExceeded(u64),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

pub type VMResult<T = ()> = Result<T, VMError>;

/// Failures turning a program file into a memory image.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: expected eight binary digits, found `{text}`")]
    MalformedLine { line: usize, text: String },
    #[error("program of {size} bytes does not fit in memory")]
    TooLarge { size: usize },
}
