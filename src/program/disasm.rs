//! Disassembler for LS-8 programs.
//!
//! Known opcodes advance by their own length bits; unknown bytes are listed
//! one at a time as data.

use crate::cpu::decode::{decode, Mnemonic, OperandKind};

/// Disassemble the instruction starting at `bytes[0]`.
///
/// Missing operand bytes read as zero.
pub fn disassemble_instruction(bytes: &[u8]) -> String {
    let opcode = bytes.first().copied().unwrap_or_default();
    let a = bytes.get(1).copied().unwrap_or_default();
    let b = bytes.get(2).copied().unwrap_or_default();

    match Mnemonic::from_opcode(opcode) {
        Some(m) => match m.operands() {
            OperandKind::None => m.to_string(),
            OperandKind::Reg => format!("{} R{}", m, a),
            OperandKind::RegReg => format!("{} R{},R{}", m, a, b),
            OperandKind::RegImm => format!("{} R{},{}", m, a, b),
        },
        None => format!(".byte {:#04X}", opcode),
    }
}

/// Bytes occupied by the instruction at `opcode`; unknown opcodes are
/// treated as single data bytes.
fn instruction_len(opcode: u8) -> usize {
    match Mnemonic::from_opcode(opcode) {
        Some(_) => decode(opcode).len as usize,
        None => 1,
    }
}

/// Disassemble a whole image into `(address, text)` pairs.
pub fn listing(bytes: &[u8]) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut addr = 0;

    while addr < bytes.len() {
        out.push((addr, disassemble_instruction(&bytes[addr..])));
        addr += instruction_len(bytes[addr]);
    }

    out
}

/// Disassemble an image to printable text.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; ----------------\n\n");

    for (addr, line) in listing(bytes) {
        let end = (addr + instruction_len(bytes[addr])).min(bytes.len());
        let raw: Vec<String> = bytes[addr..end]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        output.push_str(&format!("{:02X}: {:<12} ; {}\n", addr, line, raw.join(" ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{CALL, HLT, LDI, MUL, PRN};

    #[test]
    fn test_disassemble_instruction() {
        assert_eq!(disassemble_instruction(&[HLT]), "HLT");
        assert_eq!(disassemble_instruction(&[LDI, 0, 8]), "LDI R0,8");
        assert_eq!(disassemble_instruction(&[PRN, 3]), "PRN R3");
        assert_eq!(disassemble_instruction(&[MUL, 0, 1]), "MUL R0,R1");
        assert_eq!(disassemble_instruction(&[0xFF]), ".byte 0xFF");
    }

    #[test]
    fn test_short_operands_read_as_zero() {
        assert_eq!(disassemble_instruction(&[LDI]), "LDI R0,0");
        assert_eq!(disassemble_instruction(&[]), ".byte 0x00");
    }

    #[test]
    fn test_listing_follows_instruction_lengths() {
        let program = [LDI, 1, 6, CALL, 1, HLT, PRN, 0];
        let listing = listing(&program);

        let addrs: Vec<usize> = listing.iter().map(|(a, _)| *a).collect();
        assert_eq!(addrs, vec![0, 3, 5, 6]);
        assert_eq!(listing[1].1, "CALL R1");
    }

    #[test]
    fn test_disassemble_text() {
        let text = disassemble(&[LDI, 0, 8, HLT]);
        assert!(text.contains("00: LDI R0,8"));
        assert!(text.contains("82 00 08"));
        assert!(text.contains("03: HLT"));
    }
}
