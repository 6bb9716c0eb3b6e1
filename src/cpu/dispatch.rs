//! Opcode dispatch table and instruction handlers.
//!
//! Every handler takes both operand bytes that follow the opcode, whether
//! the instruction uses them or not. Instruction length and PC ownership
//! come from the opcode bits (see [`crate::cpu::decode`]), so registering a
//! new opcode never touches the execution loop.

use std::io::Write;

use crate::cpu::alu::{self, AluOp};
use crate::cpu::decode;
use crate::cpu::execute::{Cpu, CpuError, HaltReason};

/// An instruction handler: `(cpu, operand_a, operand_b)`.
pub type Handler<W> = fn(&mut Cpu<W>, u8, u8) -> Result<(), CpuError>;

/// Maps each of the 256 opcode values to an optional handler.
pub struct DispatchTable<W> {
    handlers: [Option<Handler<W>>; 256],
}

impl<W: Write> DispatchTable<W> {
    /// A table with no handlers registered.
    pub fn empty() -> Self {
        Self {
            handlers: [None; 256],
        }
    }

    /// The standard LS-8 instruction set.
    pub fn ls8() -> Self {
        let mut table = Self::empty();
        table.register(decode::HLT, hlt);
        table.register(decode::LDI, ldi);
        table.register(decode::PRN, prn);
        table.register(decode::ADD, alu_op);
        table.register(decode::SUB, alu_op);
        table.register(decode::MUL, alu_op);
        table.register(decode::PUSH, push);
        table.register(decode::POP, pop);
        table.register(decode::CALL, call);
        table.register(decode::RET, ret);
        table
    }

    /// Install (or replace) the handler for an opcode.
    pub fn register(&mut self, opcode: u8, handler: Handler<W>) {
        self.handlers[opcode as usize] = Some(handler);
    }

    /// Remove the handler for an opcode. Returns whether one was registered.
    pub fn unregister(&mut self, opcode: u8) -> bool {
        self.handlers[opcode as usize].take().is_some()
    }

    #[inline]
    pub fn get(&self, opcode: u8) -> Option<Handler<W>> {
        self.handlers[opcode as usize]
    }

    pub fn contains(&self, opcode: u8) -> bool {
        self.handlers[opcode as usize].is_some()
    }
}

impl<W: Write> Default for DispatchTable<W> {
    fn default() -> Self {
        Self::ls8()
    }
}

impl<W> Clone for DispatchTable<W> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers,
        }
    }
}

impl<W> std::fmt::Debug for DispatchTable<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self.handlers.iter().filter(|h| h.is_some()).count();
        f.debug_struct("DispatchTable")
            .field("registered", &registered)
            .finish()
    }
}

// ==================== Handlers ====================

fn hlt<W: Write>(cpu: &mut Cpu<W>, _: u8, _: u8) -> Result<(), CpuError> {
    cpu.halt(HaltReason::Hlt);
    Ok(())
}

fn ldi<W: Write>(cpu: &mut Cpu<W>, reg: u8, value: u8) -> Result<(), CpuError> {
    cpu.regs.write(reg, value)?;
    Ok(())
}

fn prn<W: Write>(cpu: &mut Cpu<W>, reg: u8, _: u8) -> Result<(), CpuError> {
    let value = cpu.regs.read(reg)?;
    cpu.print(value)
}

/// Shared by every ALU opcode; the operator comes from the opcode itself.
fn alu_op<W: Write>(cpu: &mut Cpu<W>, reg_a: u8, reg_b: u8) -> Result<(), CpuError> {
    let op = AluOp::from_opcode(cpu.current_opcode())?;
    alu::apply(&mut cpu.regs, op, reg_a, reg_b)?;
    Ok(())
}

fn push<W: Write>(cpu: &mut Cpu<W>, reg: u8, _: u8) -> Result<(), CpuError> {
    let value = cpu.regs.read(reg)?;
    cpu.push(value)
}

fn pop<W: Write>(cpu: &mut Cpu<W>, reg: u8, _: u8) -> Result<(), CpuError> {
    // Validate the destination before touching SP so a bad index leaves
    // the stack intact.
    cpu.regs.read(reg)?;
    let value = cpu.pop()?;
    cpu.regs.write(reg, value)?;
    Ok(())
}

fn call<W: Write>(cpu: &mut Cpu<W>, reg: u8, _: u8) -> Result<(), CpuError> {
    // Validate the target register before pushing so a bad index leaves
    // the stack intact.
    cpu.regs.read(reg)?;

    // CALL is opcode + one register byte
    let return_addr = cpu.regs.pc.wrapping_add(2);
    cpu.push(return_addr)?;

    let target = cpu.regs.read(reg)?;
    cpu.regs.jump(target);
    Ok(())
}

fn ret<W: Write>(cpu: &mut Cpu<W>, _: u8, _: u8) -> Result<(), CpuError> {
    let addr = cpu.pop()?;
    cpu.regs.jump(addr);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ls8_table_contents() {
        let table = DispatchTable::<Vec<u8>>::ls8();
        for op in [
            decode::HLT, decode::LDI, decode::PRN, decode::ADD, decode::SUB,
            decode::MUL, decode::PUSH, decode::POP, decode::CALL, decode::RET,
        ] {
            assert!(table.contains(op), "missing handler for {op:#010b}");
        }
        assert!(!table.contains(0));
        assert!(!table.contains(0xFF));
    }

    #[test]
    fn test_register_and_unregister() {
        let mut table = DispatchTable::<Vec<u8>>::empty();
        assert!(!table.contains(decode::HLT));

        table.register(decode::HLT, hlt);
        assert!(table.contains(decode::HLT));

        assert!(table.unregister(decode::HLT));
        assert!(!table.unregister(decode::HLT));
    }

    #[test]
    fn test_alu_handler_rejects_unknown_operator() {
        // Route an unimplemented ALU opcode (DIV) to the shared ALU handler.
        const DIV: u8 = 0b1010_0011;
        let mut cpu = Cpu::with_output(Vec::new());
        cpu.table_mut().register(DIV, alu_op);
        cpu.load_program(&[DIV, 0, 1, decode::HLT]).unwrap();

        let err = cpu.run().unwrap_err();
        assert_eq!(err, CpuError::UnsupportedOperation(DIV));
        assert!(cpu.is_faulted());
    }

    #[test]
    fn test_call_bad_register_leaves_stack_intact() {
        let mut cpu = Cpu::with_output(Vec::new());
        cpu.load_program(&[decode::CALL, 9, decode::HLT]).unwrap();

        let err = cpu.run().unwrap_err();
        assert_eq!(
            err,
            CpuError::RegisterError(crate::cpu::registers::RegisterError::OutOfRange(9))
        );
        assert_eq!(cpu.regs.sp(), crate::cpu::registers::STACK_TOP);
        assert_eq!(cpu.mem.read(0xF3).unwrap(), 0);
    }

    #[test]
    fn test_call_through_sp_reads_decremented_sp() {
        // CALL R7 jumps to SP after the return address is pushed
        let mut cpu = Cpu::with_output(Vec::new());
        cpu.load_program(&[decode::CALL, 7]).unwrap();
        cpu.step().unwrap();

        assert_eq!(cpu.regs.pc, 0xF3);
        assert_eq!(cpu.mem.read(0xF3).unwrap(), 2);
    }
}
