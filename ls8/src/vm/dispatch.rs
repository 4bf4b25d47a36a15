// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::io::Write;

use paste::paste;

use super::{Flow, Operands, VM};
use crate::{
    error::VMResult,
    op::{Op, RawOpCode},
};

/// Executes one instruction whose operands have already been fetched.
pub type Handler<W> = fn(&mut VM<W>, Operands) -> VMResult<Flow>;

const OPCODE_SPACE: usize = 1 << RawOpCode::BITS;

/// Opcode-indexed handler table, filled once when the machine is built.
pub struct DispatchTable<W> {
    handlers: [Option<Handler<W>>; OPCODE_SPACE],
}

impl<W> DispatchTable<W> {
    pub fn lookup(&self, opcode: RawOpCode) -> Option<Handler<W>> {
        self.handlers[opcode as usize]
    }
}

impl<W: Write> Default for DispatchTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wires `Op::<NAME>_TAG` to `VM::exec_<name>` for every listed op.
macro_rules! dispatch_table {
    ($($op:ident),* $(,)?) => {
        paste! {
            impl<W: Write> DispatchTable<W> {
                pub fn new() -> Self {
                    let mut handlers: [Option<Handler<W>>; OPCODE_SPACE] =
                        [None; OPCODE_SPACE];
                    $(
                        handlers[Op::[<$op:upper _TAG>] as usize] =
                            Some(VM::<W>::[<exec_ $op:lower>] as Handler<W>);
                    )*
                    Self { handlers }
                }
            }
        }
    };
}

dispatch_table! {
    Hlt, Ldi, Prn,
    Add, Mul, Mod, Cmp, Or, Xor, Not, Shl, Shr,
    Push, Pop, Call, Ret,
    Jmp, Jeq, Jne,
}
