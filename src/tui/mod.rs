//! TUI debugger for the LS-8 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register view (R0-R7, PC, SP)
//! - Memory hex view with PC/SP highlighting
//! - Step/run/breakpoint controls
//! - Disassembly and captured PRN output

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
