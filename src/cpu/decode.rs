//! Instruction decoder for the LS-8.
//!
//! Every instruction is one opcode byte followed by zero, one or two
//! operand bytes. The opcode byte is laid out as `AABCDDDD`:
//!
//! - `AA`: number of operands
//! - `B`: 1 if the instruction is routed through the ALU
//! - `C`: 1 if the instruction sets the PC itself
//! - `DDDD`: instruction identifier
//!
//! Decoding is a single lookup into a 256-entry table of descriptors built
//! at compile time from [`OPCODES`].

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Operations handled by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Cmp,
    And,
    Not,
    Or,
    Xor,
    Shl,
    Shr,
}

/// The operation an opcode performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    // ==================== Control ====================
    Nop,
    Hlt,

    // ==================== Data Transfer ====================
    Ldi,
    Ld,
    St,
    Push,
    Pop,

    // ==================== Output ====================
    Prn,
    Pra,

    // ==================== Control Flow ====================
    Call,
    Ret,
    Int,
    Iret,
    Jmp,
    Jeq,
    Jne,
    Jgt,
    Jlt,
    Jle,
    Jge,

    // ==================== Arithmetic / Logic ====================
    Alu(AluOp),
}

/// Kind of an operand byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A register index, 0-7.
    Reg,
    /// An 8-bit immediate value.
    Imm,
}

const NONE: &[Operand] = &[];
const REG: &[Operand] = &[Operand::Reg];
const REG_REG: &[Operand] = &[Operand::Reg, Operand::Reg];
const REG_IMM: &[Operand] = &[Operand::Reg, Operand::Imm];

/// Static description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub op: Op,
    pub operands: &'static [Operand],
    /// The handler moves the PC; the dispatcher must not auto-advance.
    pub sets_pc: bool,
}

impl OpcodeInfo {
    /// Number of operand bytes following the opcode.
    pub const fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Total encoded length in bytes.
    pub const fn len(&self) -> usize {
        1 + self.operands.len()
    }

    pub const fn is_alu(&self) -> bool {
        matches!(self.op, Op::Alu(_))
    }
}

const fn op(
    opcode: u8,
    mnemonic: &'static str,
    op: Op,
    operands: &'static [Operand],
    sets_pc: bool,
) -> OpcodeInfo {
    OpcodeInfo { opcode, mnemonic, op, operands, sets_pc }
}

/// The LS-8 instruction set.
pub const OPCODES: &[OpcodeInfo] = &[
    op(0x00, "NOP", Op::Nop, NONE, false),
    op(0x01, "HLT", Op::Hlt, NONE, false),
    op(0x11, "RET", Op::Ret, NONE, true),
    op(0x13, "IRET", Op::Iret, NONE, true),
    op(0x45, "PUSH", Op::Push, REG, false),
    op(0x46, "POP", Op::Pop, REG, false),
    op(0x47, "PRN", Op::Prn, REG, false),
    op(0x48, "PRA", Op::Pra, REG, false),
    op(0x50, "CALL", Op::Call, REG, true),
    op(0x52, "INT", Op::Int, REG, true),
    op(0x54, "JMP", Op::Jmp, REG, true),
    op(0x55, "JEQ", Op::Jeq, REG, true),
    op(0x56, "JNE", Op::Jne, REG, true),
    op(0x57, "JGT", Op::Jgt, REG, true),
    op(0x58, "JLT", Op::Jlt, REG, true),
    op(0x59, "JLE", Op::Jle, REG, true),
    op(0x5A, "JGE", Op::Jge, REG, true),
    op(0x65, "INC", Op::Alu(AluOp::Inc), REG, false),
    op(0x66, "DEC", Op::Alu(AluOp::Dec), REG, false),
    op(0x69, "NOT", Op::Alu(AluOp::Not), REG, false),
    op(0x82, "LDI", Op::Ldi, REG_IMM, false),
    op(0x83, "LD", Op::Ld, REG_REG, false),
    op(0x84, "ST", Op::St, REG_REG, false),
    op(0xA0, "ADD", Op::Alu(AluOp::Add), REG_REG, false),
    op(0xA1, "SUB", Op::Alu(AluOp::Sub), REG_REG, false),
    op(0xA2, "MUL", Op::Alu(AluOp::Mul), REG_REG, false),
    op(0xA3, "DIV", Op::Alu(AluOp::Div), REG_REG, false),
    op(0xA4, "MOD", Op::Alu(AluOp::Mod), REG_REG, false),
    op(0xA7, "CMP", Op::Alu(AluOp::Cmp), REG_REG, false),
    op(0xA8, "AND", Op::Alu(AluOp::And), REG_REG, false),
    op(0xAA, "OR", Op::Alu(AluOp::Or), REG_REG, false),
    op(0xAB, "XOR", Op::Alu(AluOp::Xor), REG_REG, false),
    op(0xAC, "SHL", Op::Alu(AluOp::Shl), REG_REG, false),
    op(0xAD, "SHR", Op::Alu(AluOp::Shr), REG_REG, false),
];

static DECODE_TABLE: [Option<OpcodeInfo>; 256] = build_decode_table();

const fn build_decode_table() -> [Option<OpcodeInfo>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < OPCODES.len() {
        let info = OPCODES[i];
        table[info.opcode as usize] = Some(info);
        i += 1;
    }
    table
}

/// Decode an opcode byte.
#[inline]
pub fn decode(opcode: u8) -> Result<&'static OpcodeInfo, DecodeError> {
    DECODE_TABLE[opcode as usize]
        .as_ref()
        .ok_or(DecodeError::IllegalOpcode(opcode))
}

/// Find an opcode by mnemonic, ignoring case.
pub fn lookup(mnemonic: &str) -> Option<&'static OpcodeInfo> {
    OPCODES.iter().find(|info| info.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// Find the descriptor for an operation.
pub fn info_for(op: Op) -> &'static OpcodeInfo {
    // Every `Op` variant has exactly one entry in OPCODES.
    OPCODES
        .iter()
        .find(|info| info.op == op)
        .unwrap_or(&OPCODES[0])
}

/// A decoded instruction: its descriptor plus operand bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub info: &'static OpcodeInfo,
    operands: [u8; 2],
}

impl Instruction {
    /// Build an instruction; operands beyond the opcode's count are ignored
    /// and missing ones read as zero.
    pub fn new(info: &'static OpcodeInfo, operands: &[u8]) -> Self {
        let mut ops = [0; 2];
        for (slot, &value) in ops.iter_mut().zip(operands).take(info.operand_count()) {
            *slot = value;
        }
        Self { info, operands: ops }
    }

    pub fn op(&self) -> Op {
        self.info.op
    }

    /// First operand byte.
    pub fn a(&self) -> u8 {
        self.operands[0]
    }

    /// Second operand byte.
    pub fn b(&self) -> u8 {
        self.operands[1]
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.info.len()
    }

    /// The operand bytes actually used by this opcode.
    pub fn operands(&self) -> &[u8] {
        &self.operands[..self.info.operand_count()]
    }

    /// Encode back to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.push(self.info.opcode);
        bytes.extend_from_slice(self.operands());
        bytes
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.info.mnemonic)?;
        for (i, (kind, value)) in self.info.operands.iter().zip(self.operands()).enumerate() {
            let sep = if i == 0 { " " } else { "," };
            match kind {
                Operand::Reg => write!(f, "{}R{}", sep, value)?,
                Operand::Imm => write!(f, "{}{}", sep, value)?,
            }
        }
        Ok(())
    }
}

/// Encode an operation with its operands.
pub fn encode(op: Op, operands: &[u8]) -> Vec<u8> {
    Instruction::new(info_for(op), operands).encode()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("illegal opcode 0x{0:02X}")]
    IllegalOpcode(u8),
}
