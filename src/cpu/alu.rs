//! Arithmetic-logic unit.
//!
//! Register-to-register arithmetic: `reg[a] := reg[a] <op> reg[b]`, wrapped
//! to 8 bits.

use crate::cpu::decode::decode;
use crate::cpu::registers::{RegisterError, Registers};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Supported ALU operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
}

impl AluOp {
    /// Decode the operator selected by an ALU opcode.
    ///
    /// ALU opcodes have bit 5 set; the low nibble picks the operator.
    pub fn from_opcode(opcode: u8) -> Result<Self, AluError> {
        if !decode(opcode).is_alu {
            return Err(AluError::UnsupportedOperation(opcode));
        }
        match opcode & 0b0000_1111 {
            0x0 => Ok(AluOp::Add),
            0x1 => Ok(AluOp::Sub),
            0x2 => Ok(AluOp::Mul),
            _ => Err(AluError::UnsupportedOperation(opcode)),
        }
    }

    /// Apply the operator to two bytes with 8-bit wraparound.
    pub fn eval(self, a: u8, b: u8) -> u8 {
        match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
        }
    }
}

/// Execute `reg[reg_a] := reg[reg_a] <op> reg[reg_b]`.
///
/// Returns the value written back into `reg_a`.
pub fn apply(regs: &mut Registers, op: AluOp, reg_a: u8, reg_b: u8) -> Result<u8, AluError> {
    let a = regs.read(reg_a)?;
    let b = regs.read(reg_b)?;
    Ok(regs.write(reg_a, op.eval(a, b))?)
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("unsupported ALU operation {0:#010b}")]
    UnsupportedOperation(u8),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_operators() {
        assert_eq!(AluOp::from_opcode(0b1010_0000), Ok(AluOp::Add));
        assert_eq!(AluOp::from_opcode(0b1010_0001), Ok(AluOp::Sub));
        assert_eq!(AluOp::from_opcode(0b1010_0010), Ok(AluOp::Mul));
    }

    #[test]
    fn test_unsupported_operation() {
        // DIV is an ALU opcode this machine does not implement
        assert_eq!(
            AluOp::from_opcode(0b1010_0011),
            Err(AluError::UnsupportedOperation(0b1010_0011))
        );
        // LDI has no ALU bit at all
        assert!(AluOp::from_opcode(0b1000_0010).is_err());
    }

    #[test]
    fn test_apply_writes_back_into_a() {
        let mut regs = Registers::new();
        regs.write(0, 2u8).unwrap();
        regs.write(1, 3u8).unwrap();

        assert_eq!(apply(&mut regs, AluOp::Mul, 0, 1).unwrap(), 6);
        assert_eq!(regs.read(0).unwrap(), 6);
        assert_eq!(regs.read(1).unwrap(), 3);
    }

    #[test]
    fn test_apply_wraps() {
        let mut regs = Registers::new();
        regs.write(0, 200u8).unwrap();
        regs.write(1, 100u8).unwrap();
        apply(&mut regs, AluOp::Add, 0, 1).unwrap();
        assert_eq!(regs.read(0).unwrap(), 44);

        regs.write(2, 1u8).unwrap();
        regs.write(3, 2u8).unwrap();
        apply(&mut regs, AluOp::Sub, 2, 3).unwrap();
        assert_eq!(regs.read(2).unwrap(), 255);
    }

    #[test]
    fn test_apply_bad_register() {
        let mut regs = Registers::new();
        assert_eq!(
            apply(&mut regs, AluOp::Add, 0, 9),
            Err(AluError::Register(RegisterError::OutOfRange(9)))
        );
    }

    proptest! {
        #[test]
        fn prop_add_and_mul_commute(a in any::<u8>(), b in any::<u8>()) {
            prop_assert_eq!(AluOp::Add.eval(a, b), AluOp::Add.eval(b, a));
            prop_assert_eq!(AluOp::Mul.eval(a, b), AluOp::Mul.eval(b, a));
            prop_assert_eq!(AluOp::Add.eval(a, b) as u32, (a as u32 + b as u32) % 256);
            prop_assert_eq!(AluOp::Mul.eval(a, b) as u32, (a as u32 * b as u32) % 256);
        }
    }
}
