//! End-to-end tests for the `ls8-emu` binary over the programs in `demos/`.

use std::path::PathBuf;
use std::process::{Command, Output};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn ls8(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ls8-emu"))
        .args(args)
        .output()
        .expect("failed to launch ls8-emu")
}

fn run_demo(name: &str) -> Output {
    let path = demo(name);
    ls8(&[path.to_str().unwrap()])
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_print8() {
    let output = run_demo("print8.ls8");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "8\n");
}

#[test]
fn test_mult() {
    let output = run_demo("mult.ls8");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "72\n");
}

#[test]
fn test_call() {
    let output = run_demo("call.ls8");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "20\n30\n");
}

#[test]
fn test_stack() {
    let output = run_demo("stack.ls8");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "2\n1\n");
}

#[test]
fn test_assembly_sources_run_directly() {
    let output = run_demo("countdown.asm");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "5\n4\n3\n2\n1\n");

    let output = run_demo("hello.asm");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "Hello!\n");
}

#[test]
fn test_division_by_zero() {
    let output = run_demo("divzero.ls8");
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("division by zero"));
}

#[test]
fn test_illegal_instruction() {
    let output = run_demo("illegal.ls8");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "1\n");
    assert!(stderr(&output).contains("illegal instruction 0xFF at address 0x05"));
}

#[test]
fn test_usage_errors() {
    let output = ls8(&[]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "");

    let print8 = demo("print8.ls8");
    let mult = demo("mult.ls8");
    let output = ls8(&[print8.to_str().unwrap(), mult.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_file() {
    let output = ls8(&["no/such/program.ls8"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("no/such/program.ls8"));
}

#[test]
fn test_program_too_large() {
    let output = run_demo("toolarge.ls8");
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("program size 257 exceeds available space 256"));
}

#[test]
fn test_cycle_limit() {
    let path = demo("countdown.asm");
    let output = ls8(&[path.to_str().unwrap(), "--max-cycles", "4"]);
    assert_eq!(output.status.code(), Some(6));
    assert_eq!(stdout(&output), "5\n");
}

#[test]
fn test_trace_goes_to_stderr() {
    let path = demo("print8.ls8");
    let output = ls8(&[path.to_str().unwrap(), "--trace"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "8\n");
    assert!(stderr(&output).starts_with("TRACE: 00 | 82 00 08 |"));
    assert_eq!(stderr(&output).lines().count(), 3);
}

#[test]
fn test_assemble_then_disassemble() {
    let dir = std::env::temp_dir().join(format!("ls8-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let image = dir.join("countdown.ls8");

    let source = demo("countdown.asm");
    let output = ls8(&["asm", source.to_str().unwrap(), "-o", image.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    let output = ls8(&[image.to_str().unwrap()]);
    assert_eq!(stdout(&output), "5\n4\n3\n2\n1\n");

    let output = ls8(&["disasm", image.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("JNE R2"));

    std::fs::remove_dir_all(&dir).unwrap();
}
