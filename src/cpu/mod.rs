//! CPU emulation for the LS-8.
//!
//! - 256 byte-wide memory cells
//! - 8 general purpose registers, R7 doubling as the stack pointer
//! - Opcodes whose own bits encode length and PC ownership

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod dispatch;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Registers, RegisterError};
pub use alu::{AluOp, AluError};
pub use decode::{decode, Decoded, Mnemonic};
pub use dispatch::{DispatchTable, Handler};
pub use execute::{Cpu, CpuError, CpuState, Cycle, HaltReason, Snapshot};
