// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

mod dispatch;
mod handlers;
#[cfg(test)]
mod tests;

use std::{fmt, io};

pub use dispatch::{DispatchTable, Handler};

use crate::{
    arch::{Address, RegisterIndex, Word, MAX_OPERANDS, REGISTER_COUNT},
    config::Config,
    error::{VMError, VMResult},
    memory::Memory,
    op::Op,
    program::Program,
    registers::{Flags, RegisterFile},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// What a handler did with the program counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Move past the instruction, using the operand count in its opcode.
    Advance,
    /// The handler already pointed the program counter somewhere else.
    Jumped,
    Halt,
}

/// Operand bytes fetched after the opcode. Unused ones are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    pub a: Word,
    pub b: Word,
}

/// The LS-8 machine. `PRN` writes to `output`.
pub struct VM<W = io::Stdout> {
    memory: Memory,
    registers: RegisterFile,
    flags: Flags,
    pc: Address,
    state: State,
    steps: u64,
    config: Config,
    dispatch: DispatchTable<W>,
    output: W,
}

impl Default for VM {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: io::Write> VM<W> {
    pub fn new(output: W) -> Self {
        Self {
            memory: Memory::default(),
            registers: RegisterFile::default(),
            flags: Flags::default(),
            pc: 0,
            state: State::Running,
            steps: 0,
            config: Config::default(),
            dispatch: DispatchTable::new(),
            output,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Copies `image` to address zero and resets the rest of the machine so
    /// it starts fresh from the first byte.
    pub fn load(&mut self, image: &[Word]) -> VMResult {
        self.memory.load(image)?;
        self.registers = RegisterFile::default();
        self.flags = Flags::default();
        self.pc = 0;
        self.state = State::Running;
        self.steps = 0;
        tracing::debug!(bytes = image.len(), "loaded program");
        Ok(())
    }

    pub fn load_program(&mut self, program: &Program) -> VMResult {
        self.load(program.image())
    }

    /// Runs the [`VM`] until it executes `HLT` or faults.
    pub fn run(&mut self) -> VMResult {
        while self.step()? == State::Running {}
        Ok(())
    }

    /// Executes one instruction. Any fault halts the machine for good;
    /// stepping a halted machine does nothing.
    pub fn step(&mut self) -> VMResult<State> {
        if self.state == State::Halted {
            return Ok(State::Halted);
        }

        if let Err(error) = self.execute() {
            tracing::debug!(pc = self.pc, %error, "machine faulted");
            self.state = State::Halted;
            return Err(error);
        }

        Ok(self.state)
    }

    fn execute(&mut self) -> VMResult {
        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                return Err(VMError::StepLimitExceeded(limit));
            }
        }
        if self.config.trace {
            eprintln!("{}", self.snapshot());
        }

        let opcode = self.memory.read(self.pc)?;
        let handler = self.dispatch.lookup(opcode).ok_or(
            VMError::UnrecognizedOpcode {
                opcode,
                address: self.pc,
            },
        )?;
        let operand_count = Op::operand_count_of(opcode);
        let operands = self.fetch_operands(operand_count)?;

        tracing::trace!(
            pc = self.pc,
            op = Op::mnemonic_of(opcode),
            a = operands.a,
            b = operands.b,
            "executing"
        );
        self.steps += 1;

        match handler(self, operands)? {
            Flow::Advance => self.pc += 1 + operand_count,
            Flow::Jumped => {}
            Flow::Halt => {
                self.state = State::Halted;
                tracing::debug!(pc = self.pc, steps = self.steps, "halted");
            }
        }
        Ok(())
    }

    fn fetch_operands(&self, count: usize) -> VMResult<Operands> {
        let mut operands = [0; MAX_OPERANDS];
        for (offset, operand) in operands.iter_mut().enumerate().take(count) {
            *operand = self.memory.read(self.pc + 1 + offset)?;
        }
        Ok(Operands {
            a: operands[0],
            b: operands[1],
        })
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<W> VM<W> {
    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of instructions executed since the last load.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn register(&self, index: RegisterIndex) -> VMResult<Word> {
        self.registers.get(index)
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut registers = [0; REGISTER_COUNT];
        registers.copy_from_slice(self.registers.as_slice());
        Snapshot {
            pc: self.pc,
            upcoming: [0, 1, 2].map(|offset| self.memory.peek(self.pc + offset)),
            registers,
        }
    }
}

/// Machine state as printed by trace mode: the program counter, the three
/// bytes starting there, and every register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: Address,
    pub upcoming: [Option<Word>; 3],
    pub registers: [Word; REGISTER_COUNT],
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRACE: {:02X} |", self.pc)?;
        for byte in self.upcoming {
            match byte {
                Some(byte) => write!(f, " {byte:02X}")?,
                None => write!(f, " --")?,
            }
        }
        write!(f, " |")?;
        for register in self.registers {
            write!(f, " {register:02X}")?;
        }
        Ok(())
    }
}
