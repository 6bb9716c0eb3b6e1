//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: eight 8-bit general purpose registers
//! - R7 doubles as the stack pointer (SP), starting at 0xF4
//! - PC: the 8-bit program counter

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the register reserved as the stack pointer.
pub const SP: u8 = 7;

/// Initial stack pointer; also the empty-stack sentinel.
pub const STACK_TOP: u8 = 0xF4;

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7. R7 is the stack pointer.
    gp: [u8; REGISTER_COUNT],

    /// PC: address of the next instruction to fetch
    pub pc: u8,
}

impl Registers {
    /// Create a new register file: everything zero except SP.
    pub fn new() -> Self {
        let mut gp = [0; REGISTER_COUNT];
        gp[SP as usize] = STACK_TOP;
        Self { gp, pc: 0 }
    }

    /// Reset all registers to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a register by index (0-7).
    #[inline]
    pub fn read(&self, index: u8) -> Result<u8, RegisterError> {
        self.gp
            .get(index as usize)
            .copied()
            .ok_or(RegisterError::OutOfRange(index))
    }

    /// Write a register by index (0-7), wrapping the value to 8 bits.
    /// Returns the stored byte.
    #[inline]
    pub fn write(&mut self, index: u8, value: impl Into<u32>) -> Result<u8, RegisterError> {
        let slot = self
            .gp
            .get_mut(index as usize)
            .ok_or(RegisterError::OutOfRange(index))?;
        *slot = value.into() as u8;
        Ok(*slot)
    }

    /// Current stack pointer (R7).
    pub fn sp(&self) -> u8 {
        self.gp[SP as usize]
    }

    /// Set the stack pointer (R7).
    pub fn set_sp(&mut self, value: u8) {
        self.gp[SP as usize] = value;
    }

    /// True when SP sits at the empty-stack sentinel.
    pub fn stack_is_empty(&self) -> bool {
        self.sp() == STACK_TOP
    }

    /// Advance the program counter by `len` bytes, wrapping at 256.
    /// Returns the old value.
    pub fn advance_pc(&mut self, len: u8) -> u8 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(len);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr;
    }

    /// All general purpose registers, R0 first.
    pub fn as_array(&self) -> [u8; REGISTER_COUNT] {
        self.gp
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from register file access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (0-7)")]
    OutOfRange(u8),
}
