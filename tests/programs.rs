//! Runs the bundled `.ls8` programs end to end.

use ls8::cpu::registers::STACK_TOP;
use ls8::{parse_image, Cpu, HaltReason};

fn run(source: &str) -> (Cpu<Vec<u8>>, String) {
    let image = parse_image(source).unwrap();
    let mut cpu = Cpu::with_output(Vec::new());
    cpu.load_program(&image.bytes).unwrap();
    cpu.run().unwrap();

    let output = String::from_utf8(cpu.output().clone()).unwrap();
    (cpu, output)
}

#[test]
fn print8() {
    let (cpu, output) = run(include_str!("../programs/print8.ls8"));

    assert_eq!(output, "8\n");
    assert_eq!(cpu.cycles, 3);
    assert_eq!(cpu.halt_reason, Some(HaltReason::Hlt));
}

#[test]
fn mult() {
    let (_, output) = run(include_str!("../programs/mult.ls8"));
    assert_eq!(output, "72\n");
}

#[test]
fn stack() {
    let (cpu, output) = run(include_str!("../programs/stack.ls8"));

    assert_eq!(output, "2\n4\n1\n");
    assert_eq!(cpu.regs.sp(), STACK_TOP);
}

#[test]
fn call() {
    let (cpu, output) = run(include_str!("../programs/call.ls8"));

    assert_eq!(output, "20\n30\n36\n60\n");
    assert_eq!(cpu.regs.sp(), STACK_TOP);
    assert_eq!(cpu.regs.pc, 23);
}

#[test]
fn disassembles_call_program() {
    let image = parse_image(include_str!("../programs/call.ls8")).unwrap();
    let text = ls8::disassemble(&image.bytes);

    assert!(text.contains("00: LDI R1,24"));
    assert!(text.contains("06: CALL R1"));
    assert!(text.contains("17: HLT"));
    assert!(text.contains("18: ADD R0,R0"));
    assert!(text.contains("1D: RET"));
}
