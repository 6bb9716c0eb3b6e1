//! Instruction decoder for the LS-8.
//!
//! Instructions are 1-3 bytes. The opcode byte describes itself:
//!
//! ```text
//! AABCDDDD
//! AA    number of operand bytes (0-2)
//! B     1 if this is an ALU operation
//! C     1 if the instruction sets the PC itself
//! DDDD  instruction identifier
//! ```
//!
//! The execution loop only needs [`decode`]; the mnemonic table below is
//! for the disassembler and logging.

use serde::{Serialize, Deserialize};

pub const HLT: u8 = 0b0000_0001;
pub const LDI: u8 = 0b1000_0010;
pub const PRN: u8 = 0b0100_0111;
pub const ADD: u8 = 0b1010_0000;
pub const SUB: u8 = 0b1010_0001;
pub const MUL: u8 = 0b1010_0010;
pub const PUSH: u8 = 0b0100_0101;
pub const POP: u8 = 0b0100_0110;
pub const CALL: u8 = 0b0101_0000;
pub const RET: u8 = 0b0001_0001;

/// Control information carried by the opcode byte's own bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    /// The raw opcode byte.
    pub opcode: u8,
    /// Total instruction length in bytes (1-3).
    pub len: u8,
    /// The handler owns the PC; the loop must not advance it.
    pub sets_pc: bool,
    /// The instruction is an ALU operation.
    pub is_alu: bool,
}

/// Decode length and control-flow flags from an opcode byte.
///
/// Operand counts above two are not part of the encoding; an opcode claiming
/// three operands still reports a 4-byte length and is left to the dispatch
/// table to reject.
#[inline]
pub fn decode(opcode: u8) -> Decoded {
    Decoded {
        opcode,
        len: ((opcode >> 6) & 0b11) + 1,
        sets_pc: (opcode >> 4) & 1 == 1,
        is_alu: (opcode >> 5) & 1 == 1,
    }
}

/// Known LS-8 instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mnemonic {
    Hlt,
    Ldi,
    Prn,
    Add,
    Sub,
    Mul,
    Push,
    Pop,
    Call,
    Ret,
}

/// How an instruction's operand bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Reg,
    RegReg,
    RegImm,
}

impl Mnemonic {
    pub const ALL: [Mnemonic; 10] = [
        Mnemonic::Hlt,
        Mnemonic::Ldi,
        Mnemonic::Prn,
        Mnemonic::Add,
        Mnemonic::Sub,
        Mnemonic::Mul,
        Mnemonic::Push,
        Mnemonic::Pop,
        Mnemonic::Call,
        Mnemonic::Ret,
    ];

    /// Look up the instruction for an opcode byte.
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.opcode() == opcode)
    }

    pub fn opcode(self) -> u8 {
        match self {
            Mnemonic::Hlt => HLT,
            Mnemonic::Ldi => LDI,
            Mnemonic::Prn => PRN,
            Mnemonic::Add => ADD,
            Mnemonic::Sub => SUB,
            Mnemonic::Mul => MUL,
            Mnemonic::Push => PUSH,
            Mnemonic::Pop => POP,
            Mnemonic::Call => CALL,
            Mnemonic::Ret => RET,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::Hlt => "HLT",
            Mnemonic::Ldi => "LDI",
            Mnemonic::Prn => "PRN",
            Mnemonic::Add => "ADD",
            Mnemonic::Sub => "SUB",
            Mnemonic::Mul => "MUL",
            Mnemonic::Push => "PUSH",
            Mnemonic::Pop => "POP",
            Mnemonic::Call => "CALL",
            Mnemonic::Ret => "RET",
        }
    }

    pub fn operands(self) -> OperandKind {
        match self {
            Mnemonic::Hlt | Mnemonic::Ret => OperandKind::None,
            Mnemonic::Prn | Mnemonic::Push | Mnemonic::Pop | Mnemonic::Call => OperandKind::Reg,
            Mnemonic::Add | Mnemonic::Sub | Mnemonic::Mul => OperandKind::RegReg,
            Mnemonic::Ldi => OperandKind::RegImm,
        }
    }
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
