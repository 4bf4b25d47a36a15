// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use num_traits::{
    AsPrimitive, CheckedRem, CheckedShl, CheckedShr, PrimInt, WrappingAdd,
    WrappingMul,
};

use crate::{
    error::{VMError, VMResult},
    registers::Flags,
};

/// Register-to-register operations. Comparison is not one of them: it only
/// writes flags, see [`compare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Mul,
    Mod,
    Or,
    Xor,
    /// Ignores its second operand.
    Not,
    Shl,
    Shr,
}

/// Computes `op` on `a` and `b`, wrapping at the width of `W` the way the
/// hardware registers do. Shifting by the full width or more clears the
/// value.
pub fn compute<W>(op: AluOp, a: W, b: W) -> VMResult<W>
where
    W: PrimInt
        + WrappingAdd
        + WrappingMul
        + CheckedRem
        + CheckedShl
        + CheckedShr
        + AsPrimitive<u32>,
{
    Ok(match op {
        AluOp::Add => a.wrapping_add(&b),
        AluOp::Mul => a.wrapping_mul(&b),
        AluOp::Mod => a.checked_rem(&b).ok_or(VMError::DivisionByZero)?,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Not => !a,
        AluOp::Shl => a.checked_shl(b.as_()).unwrap_or_else(W::zero),
        AluOp::Shr => a.checked_shr(b.as_()).unwrap_or_else(W::zero),
    })
}

pub fn compare<W: Ord>(a: W, b: W) -> Flags {
    Flags::from_ordering(a.cmp(&b))
}
