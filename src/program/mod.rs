//! Program images: loading from text and disassembly.

pub mod loader;
pub mod disasm;

pub use loader::{load_image, parse_image, LoadError, ProgramImage};
pub use disasm::{disassemble, disassemble_instruction};
