//! Drives the `ls8` binary and checks what reaches stdout.

use std::path::PathBuf;
use std::process::{Command, Output};

fn write_image(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ls8-cli-{}-{}.ls8", std::process::id(), name));
    std::fs::write(&path, source).unwrap();
    path
}

fn ls8(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ls8"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn illegal_opcode_keeps_log_records_off_stdout() {
    let path = write_image(
        "illegal",
        "10000010 # LDI R0,5\n00000000\n00000101\n01000111 # PRN R0\n00000000\n11111111\n",
    );

    for verbosity in [None, Some("-v"), Some("-vv")] {
        let mut args = vec!["run", path.to_str().unwrap()];
        args.extend(verbosity);
        let out = ls8(&args);

        assert!(out.status.success(), "{:?}", out);
        assert_eq!(String::from_utf8_lossy(&out.stdout), "5\n");
        assert!(String::from_utf8_lossy(&out.stderr).contains("illegal opcode"));
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn empty_image_halts_cleanly() {
    let path = write_image("empty", "# nothing but a comment\n\n");
    let out = ls8(&["run", path.to_str().unwrap()]);

    assert!(out.status.success(), "{:?}", out);
    assert!(out.stdout.is_empty());

    std::fs::remove_file(path).ok();
}

#[test]
fn trace_goes_to_stderr() {
    let path = write_image("trace", "10000010\n00000000\n00001000\n01000111\n00000000\n00000001\n");
    let out = ls8(&["run", "--trace", path.to_str().unwrap()]);

    assert!(out.status.success(), "{:?}", out);
    assert_eq!(String::from_utf8_lossy(&out.stdout), "8\n");
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("TRACE: 00 | 82 00 08 |"));

    std::fs::remove_file(path).ok();
}
