//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle. Handlers live in the dispatch
//! table; this module owns the machine state they mutate.

use std::io::{self, Stdout, Write};

use crate::cpu::{Memory, Registers};
use crate::cpu::alu::AluError;
use crate::cpu::decode::{self, Mnemonic};
use crate::cpu::dispatch::DispatchTable;
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{RegisterError, REGISTER_COUNT};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (HLT or an unknown opcode).
    Halted,
    /// CPU stopped on a fault.
    Error,
}

/// Why the CPU entered the `Halted` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Executed HLT.
    Hlt,
    /// Fetched an opcode with no registered handler.
    IllegalOpcode { opcode: u8, pc: u8 },
}

/// One completed fetch-decode-execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    /// Address the instruction was fetched from.
    pub pc: u8,
    pub opcode: u8,
    pub operand_a: u8,
    pub operand_b: u8,
    /// False when the opcode had no handler and the CPU halted instead.
    pub dispatched: bool,
}

/// The LS-8 CPU.
///
/// `W` receives PRN output; it is stdout unless built with [`Cpu::with_output`].
pub struct Cpu<W = Stdout> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed.
    pub cycles: u64,
    /// Set once the CPU halts.
    pub halt_reason: Option<HaltReason>,
    /// Opcode of the instruction being executed.
    ir: u8,
    table: DispatchTable<W>,
    out: W,
}

impl Cpu<Stdout> {
    /// Create a new CPU that prints to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Cpu<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Cpu<W> {
    /// Create a new CPU with the standard instruction set, printing to `out`.
    pub fn with_output(out: W) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            halt_reason: None,
            ir: 0,
            table: DispatchTable::ls8(),
            out,
        }
    }

    /// Reset registers, memory and state. The dispatch table and output
    /// sink are kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.halt_reason = None;
        self.ir = 0;
    }

    /// Load a program image at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction.
    ///
    /// A fault moves the CPU to [`CpuState::Error`] and is returned. An
    /// unknown opcode halts the CPU and is not an error.
    pub fn step(&mut self) -> Result<Cycle, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        self.cycle().map_err(|e| {
            log::debug!("fault at PC={:02X}: {}", self.regs.pc, e);
            self.state = CpuState::Error;
            e
        })
    }

    fn cycle(&mut self) -> Result<Cycle, CpuError> {
        // Fetch
        let pc = self.regs.pc;
        let opcode = self.mem.read(pc as usize)?;
        let operand_a = self.mem.read(pc.wrapping_add(1) as usize)?;
        let operand_b = self.mem.read(pc.wrapping_add(2) as usize)?;

        // Decode
        let decoded = decode::decode(opcode);
        self.ir = opcode;

        // Execute
        let dispatched = match self.table.get(opcode) {
            Some(handler) => {
                log::debug!(
                    "{:02X}: {} {:02X} {:02X}",
                    pc,
                    Mnemonic::from_opcode(opcode).map_or("???", Mnemonic::name),
                    operand_a,
                    operand_b
                );
                handler(self, operand_a, operand_b)?;
                true
            }
            None => {
                log::warn!("illegal opcode {:#010b} at PC={:02X}, halting", opcode, pc);
                self.halt(HaltReason::IllegalOpcode { opcode, pc });
                false
            }
        };

        if !decoded.sets_pc && self.state == CpuState::Running {
            self.regs.advance_pc(decoded.len);
        }

        if dispatched {
            self.cycles += 1;
        }

        Ok(Cycle { pc, opcode, operand_a, operand_b, dispatched })
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    // ==================== Handler primitives ====================

    /// Stop execution.
    pub fn halt(&mut self, reason: HaltReason) {
        log::info!("halted after {} cycles: {:?}", self.cycles, reason);
        self.state = CpuState::Halted;
        self.halt_reason = Some(reason);
    }

    /// `SP := SP - 1; mem[SP] := value`
    pub fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let sp = self.regs.sp().wrapping_sub(1);
        self.regs.set_sp(sp);
        self.mem.write(sp as usize, value)?;
        Ok(())
    }

    /// `value := mem[SP]; SP := SP + 1`, failing on an empty stack.
    pub fn pop(&mut self) -> Result<u8, CpuError> {
        if self.regs.stack_is_empty() {
            return Err(CpuError::StackUnderflow { pc: self.regs.pc });
        }
        let sp = self.regs.sp();
        let value = self.mem.read(sp as usize)?;
        self.regs.set_sp(sp.wrapping_add(1));
        Ok(value)
    }

    /// Write a decimal line to the output sink.
    pub fn print(&mut self, value: u8) -> Result<(), CpuError> {
        writeln!(self.out, "{}", value).map_err(|e| CpuError::Output(e.to_string()))
    }

    /// Opcode of the instruction currently (or most recently) executed.
    pub fn current_opcode(&self) -> u8 {
        self.ir
    }

    // ==================== Inspection ====================

    /// The dispatch table, for registering extra opcodes.
    pub fn table_mut(&mut self) -> &mut DispatchTable<W> {
        &mut self.table
    }

    /// The output sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Consume the CPU and return its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Check if the CPU stopped on a fault.
    pub fn is_faulted(&self) -> bool {
        self.state == CpuState::Error
    }

    /// One-line dump of PC, the next three bytes and all registers.
    pub fn trace(&self) -> String {
        let pc = self.regs.pc;
        let peek = |offset: u8| self.mem.read(pc.wrapping_add(offset) as usize).unwrap_or_default();

        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            peek(0),
            peek(1),
            peek(2)
        );
        for value in self.regs.as_array() {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }

    /// Capture the full machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.regs.pc,
            registers: self.regs.as_array(),
            memory: self.mem.as_slice().to_vec(),
            state: self.state,
            halt_reason: self.halt_reason,
            cycles: self.cycles,
        }
    }
}

impl<W> std::fmt::Debug for Cpu<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("halt_reason", &self.halt_reason)
            .finish()
    }
}

/// Serializable machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: u8,
    pub registers: [u8; REGISTER_COUNT],
    pub memory: Vec<u8>,
    pub state: CpuState,
    pub halt_reason: Option<HaltReason>,
    pub cycles: u64,
}

impl Snapshot {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("register error: {0}")]
    RegisterError(#[from] RegisterError),

    #[error("unsupported ALU operation {0:#010b}")]
    UnsupportedOperation(u8),

    #[error("stack underflow at PC={pc:02X}")]
    StackUnderflow { pc: u8 },

    #[error("output error: {0}")]
    Output(String),
}

impl From<AluError> for CpuError {
    fn from(e: AluError) -> Self {
        match e {
            AluError::UnsupportedOperation(op) => CpuError::UnsupportedOperation(op),
            AluError::Register(e) => CpuError::RegisterError(e),
        }
    }
}
