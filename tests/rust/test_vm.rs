//! VM tests -- stack machine semantics over raw byte streams

use ahlelele_lang::vm::cursor::Cursor;
use ahlelele_lang::vm::disasm::{disassemble, render_listing};
use ahlelele_lang::vm::machine::{execute_to_vec, ExecutionReport, RuntimeError, VM};
use ahlelele_lang::vm::opcodes::{Opcode, INVALID_INVOKE};

// ── Helpers ──────────────────────────────────────────────────────

/// Tiny assembler: pushes and operations, no implicit halt.
#[derive(Default)]
struct Asm {
    code: Vec<u8>,
}

impl Asm {
    fn push(mut self, v: i64) -> Self {
        self.code.push(Opcode::Push.as_byte());
        self.code.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn op(mut self, op: Opcode) -> Self {
        self.code.push(op.as_byte());
        self
    }

    fn byte(mut self, b: u8) -> Self {
        self.code.push(b);
        self
    }

    fn build(self) -> Vec<u8> {
        self.code
    }
}

fn asm() -> Asm {
    Asm::default()
}

fn run_ok(code: &[u8]) -> String {
    let (result, out) = execute_to_vec(code);
    result.unwrap();
    String::from_utf8(out).unwrap()
}

fn run_err(code: &[u8]) -> (RuntimeError, String) {
    let (result, out) = execute_to_vec(code);
    (result.unwrap_err(), String::from_utf8(out).unwrap())
}

// ── 1. Basics ───────────────────────────────────────────────────

#[test]
fn empty_stream_is_a_noop() {
    let (result, out) = execute_to_vec(&[]);
    assert_eq!(result.unwrap(), ExecutionReport::default());
    assert!(out.is_empty());
}

#[test]
fn halt_only() {
    let (result, out) = execute_to_vec(&[Opcode::Halt.as_byte()]);
    let report = result.unwrap();
    assert!(report.halted);
    assert_eq!(report.instructions, 1);
    assert!(out.is_empty());
}

#[test]
fn print_number() {
    assert_eq!(run_ok(&asm().push(42).op(Opcode::PrintNum).build()), "42");
}

#[test]
fn print_negative_number() {
    assert_eq!(run_ok(&asm().push(-7).op(Opcode::PrintNum).build()), "-7");
}

#[test]
fn print_char() {
    assert_eq!(run_ok(&asm().push(65).op(Opcode::PrintChar).build()), "A");
}

#[test]
fn print_char_uses_low_byte() {
    let code = asm().push(256 + 66).op(Opcode::PrintChar).build();
    assert_eq!(run_ok(&code), "B");
}

#[test]
fn print_char_writes_raw_byte() {
    let (result, out) = execute_to_vec(&asm().push(200).op(Opcode::PrintChar).build());
    result.unwrap();
    assert_eq!(out, vec![200u8]);
}

#[test]
fn stream_without_halt_runs_to_end() {
    let (result, _) = execute_to_vec(&asm().push(1).op(Opcode::Drop).build());
    let report = result.unwrap();
    assert!(!report.halted);
    assert_eq!(report.instructions, 2);
}

#[test]
fn stops_at_first_halt() {
    let code = asm()
        .push(1)
        .op(Opcode::PrintNum)
        .op(Opcode::Halt)
        .push(2)
        .op(Opcode::PrintNum)
        .op(Opcode::Halt)
        .build();
    assert_eq!(run_ok(&code), "1");
}

#[test]
fn bytes_after_halt_are_never_decoded() {
    let code = asm().op(Opcode::Halt).byte(0x42).build();
    assert_eq!(run_ok(&code), "");
}

#[test]
fn report_tracks_stack_depth() {
    let code = asm().push(1).push(2).push(3).op(Opcode::Add).op(Opcode::Halt).build();
    let (result, _) = execute_to_vec(&code);
    let report = result.unwrap();
    assert_eq!(report.max_stack_depth, 3);
    assert_eq!(report.instructions, 5);
}

// ── 2. Arithmetic ───────────────────────────────────────────────

#[test]
fn add() {
    let code = asm().push(10).push(25).op(Opcode::Add).op(Opcode::PrintNum).build();
    assert_eq!(run_ok(&code), "35");
}

#[test]
fn sub_pops_b_then_a() {
    let code = asm().push(50).push(8).op(Opcode::Sub).op(Opcode::PrintNum).build();
    assert_eq!(run_ok(&code), "42");
}

#[test]
fn mul() {
    let code = asm().push(6).push(-7).op(Opcode::Mul).op(Opcode::PrintNum).build();
    assert_eq!(run_ok(&code), "-42");
}

#[test]
fn div_truncates() {
    let code = asm().push(7).push(2).op(Opcode::Div).op(Opcode::PrintNum).build();
    assert_eq!(run_ok(&code), "3");
}

#[test]
fn div_truncates_toward_zero() {
    let code = asm().push(-7).push(2).op(Opcode::Div).op(Opcode::PrintNum).build();
    assert_eq!(run_ok(&code), "-3");
}

#[test]
fn div_by_zero() {
    let code = asm().push(10).push(0).op(Opcode::Div).build();
    let (err, _) = run_err(&code);
    assert!(matches!(err, RuntimeError::DivisionByZero { offset: 18 }));
}

#[test]
fn add_overflow_is_an_error() {
    let code = asm().push(i64::MAX).push(1).op(Opcode::Add).build();
    let (err, _) = run_err(&code);
    assert!(matches!(
        err,
        RuntimeError::IntegerOverflow { opcode: Opcode::Add, .. }
    ));
}

#[test]
fn min_div_minus_one_is_an_error() {
    let code = asm().push(i64::MIN).push(-1).op(Opcode::Div).build();
    let (err, _) = run_err(&code);
    assert!(matches!(
        err,
        RuntimeError::IntegerOverflow { opcode: Opcode::Div, .. }
    ));
}

// ── 3. Stack manipulation ───────────────────────────────────────

#[test]
fn dup() {
    let code = asm()
        .push(5)
        .op(Opcode::Dup)
        .op(Opcode::Mul)
        .op(Opcode::PrintNum)
        .build();
    assert_eq!(run_ok(&code), "25");
}

#[test]
fn swap() {
    let code = asm()
        .push(1)
        .push(2)
        .op(Opcode::Swap)
        .op(Opcode::PrintNum)
        .op(Opcode::PrintNum)
        .build();
    assert_eq!(run_ok(&code), "12");
}

#[test]
fn drop_discards_top() {
    let code = asm()
        .push(1)
        .push(2)
        .op(Opcode::Drop)
        .op(Opcode::PrintNum)
        .build();
    assert_eq!(run_ok(&code), "1");
}

// ── 4. Underflow ────────────────────────────────────────────────

#[test]
fn add_on_empty_stack() {
    let (err, _) = run_err(&asm().op(Opcode::Add).build());
    assert!(matches!(
        err,
        RuntimeError::StackUnderflow { opcode: Opcode::Add, needed: 2, available: 0, offset: 0 }
    ));
}

#[test]
fn add_on_single_value() {
    let (err, _) = run_err(&asm().push(1).op(Opcode::Add).build());
    assert!(matches!(
        err,
        RuntimeError::StackUnderflow { needed: 2, available: 1, offset: 9, .. }
    ));
}

#[test]
fn swap_on_single_value() {
    let (err, _) = run_err(&asm().push(1).op(Opcode::Swap).build());
    assert!(matches!(
        err,
        RuntimeError::StackUnderflow { opcode: Opcode::Swap, available: 1, .. }
    ));
}

#[test]
fn underflow_for_every_consuming_operation() {
    for op in [
        Opcode::PrintChar,
        Opcode::PrintNum,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Dup,
        Opcode::Drop,
    ] {
        let (err, _) = run_err(&asm().op(op).build());
        match err {
            RuntimeError::StackUnderflow { opcode, .. } => assert_eq!(opcode, op),
            other => panic!("Expected StackUnderflow for {}, got {:?}", op, other),
        }
    }
}

#[test]
fn output_before_error_is_kept() {
    let code = asm()
        .push(72)
        .op(Opcode::PrintChar)
        .push(105)
        .op(Opcode::PrintChar)
        .op(Opcode::Drop)
        .push(0)
        .op(Opcode::PrintNum)
        .build();
    let (err, out) = run_err(&code);
    assert!(matches!(err, RuntimeError::StackUnderflow { .. }));
    assert_eq!(out, "Hi");
}

// ── 5. Malformed streams ────────────────────────────────────────

#[test]
fn unknown_opcode() {
    let (err, _) = run_err(&asm().push(1).byte(10).build());
    assert!(matches!(err, RuntimeError::UnknownOpcode { byte: 10, offset: 9 }));
}

#[test]
fn invalid_invoke_byte_is_named_as_read() {
    let (err, _) = run_err(&asm().byte(INVALID_INVOKE).build());
    assert!(matches!(err, RuntimeError::UnknownOpcode { byte: 0xFE, offset: 0 }));
    assert_eq!(err.to_string(), "unknown opcode 254 at offset 0");
}

#[test]
fn every_unassigned_byte_is_named_as_read() {
    for byte in 10u8..=0xFE {
        let (err, _) = run_err(&asm().push(1).byte(byte).build());
        match err {
            RuntimeError::UnknownOpcode { byte: found, offset } => {
                assert_eq!(found, byte);
                assert_eq!(offset, 9);
            }
            other => panic!("Expected UnknownOpcode for {}, got {:?}", byte, other),
        }
    }
}

#[test]
fn truncated_operand() {
    let code = asm().byte(Opcode::Push.as_byte()).byte(1).byte(2).byte(3).build();
    let (err, _) = run_err(&code);
    assert!(matches!(err, RuntimeError::TruncatedOperand { offset: 1, remaining: 3 }));
}

#[test]
fn push_tag_at_end_of_stream() {
    let (err, _) = run_err(&[Opcode::Push.as_byte()]);
    assert!(matches!(err, RuntimeError::TruncatedOperand { offset: 1, remaining: 0 }));
}

#[test]
fn cursor_reports_end_of_bytecode() {
    let mut cursor = Cursor::new(&[7]);
    assert_eq!(cursor.read_u8().unwrap(), 7);
    assert!(cursor.is_at_end());
    assert!(matches!(
        cursor.read_u8(),
        Err(RuntimeError::UnexpectedEndOfBytecode { offset: 1 })
    ));
}

#[test]
fn cursor_reads_little_endian_operand() {
    let bytes = (-2i64).to_le_bytes();
    let mut cursor = Cursor::new(&bytes);
    assert_eq!(cursor.read_i64().unwrap(), -2);
    assert_eq!(cursor.position(), 8);
    assert_eq!(cursor.remaining(), 0);
}

// ── 6. Output sink ──────────────────────────────────────────────

#[test]
fn vm_is_reusable_and_starts_with_empty_stack() {
    let mut vm = VM::new(Vec::new());
    vm.execute(&asm().push(1).push(2).build()).unwrap();
    // Leftover values from the previous run must not be visible
    let err = vm.execute(&asm().op(Opcode::Drop).build()).unwrap_err();
    assert!(matches!(err, RuntimeError::StackUnderflow { available: 0, .. }));
}

#[test]
fn output_accumulates_across_runs() {
    let mut vm = VM::new(Vec::new());
    vm.execute(&asm().push(1).op(Opcode::PrintNum).build()).unwrap();
    vm.execute(&asm().push(2).op(Opcode::PrintNum).build()).unwrap();
    assert_eq!(vm.output(), b"12");
}

// ── 7. Disassembly ──────────────────────────────────────────────

#[test]
fn disassemble_lists_everything() {
    let code = asm().push(65).op(Opcode::PrintChar).op(Opcode::Halt).byte(42).build();
    let entries = disassemble(&code).unwrap();
    let summary: Vec<(usize, &str, Option<i64>)> = entries
        .iter()
        .map(|e| (e.offset, e.mnemonic, e.operand))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "push", Some(65)),
            (9, "print_char", None),
            (10, "halt", None),
            (11, "unknown", None),
        ]
    );
}

#[test]
fn disassemble_truncated_push_fails() {
    let err = disassemble(&[Opcode::Push.as_byte(), 0]).unwrap_err();
    assert!(matches!(err, RuntimeError::TruncatedOperand { offset: 1, remaining: 1 }));
}

#[test]
fn listing_format() {
    let entries = disassemble(&asm().push(-3).op(Opcode::Halt).build()).unwrap();
    assert_eq!(render_listing(&entries), "0000  ff  push -3\n0009  09  halt\n");
}
