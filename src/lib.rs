//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a small 8-bit register machine.
//!
//! Programs are byte images loaded at address 0. The CPU fetches an opcode
//! and its two following bytes, reads the instruction length and PC
//! ownership from the opcode's own bits, and hands off to a per-opcode
//! handler in the dispatch table.

pub mod cpu;
pub mod program;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, CpuState, HaltReason, Memory, Registers, Snapshot};
pub use program::{disassemble, load_image, parse_image, LoadError, ProgramImage};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
