//! Simple assembler for LS-8 programs.
//!
//! Syntax:
//! ```text
//! ; Comment (or # comment)
//! LABEL:              ; Define a label
//!     LDI R0,8        ; Register and immediate operands
//!     LDI R1,LABEL    ; Labels resolve to addresses
//!     ADD R0,R1
//!     PRN R0
//!     HLT
//!
//!     DB 0x0A         ; Emit one raw byte
//!     DS Hello        ; Emit raw ASCII text
//! ```
//!
//! Immediates may be decimal, `0x` hex, `0b` binary or a label.

use crate::cpu::decode::{lookup, Instruction, OpcodeInfo, Operand};
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to machine code.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// One sized line of source, recorded in pass 1.
#[derive(Debug)]
enum Item<'a> {
    Instr {
        info: &'static OpcodeInfo,
        operands: Vec<&'a str>,
    },
    Byte(&'a str),
    Text(&'a str),
}

/// The assembler state.
struct Assembler<'a> {
    /// Current address.
    current_addr: usize,
    /// Symbol table (label -> address).
    symbols: HashMap<String, usize>,
    /// Sized items awaiting emission: (source_line, item).
    items: Vec<(usize, Item<'a>)>,
}

impl<'a> Assembler<'a> {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &'a str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: collect labels and size every line
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        if self.current_addr > MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge { size: self.current_addr });
        }

        // Pass 2: emit bytes with labels resolved
        let mut output = Vec::with_capacity(self.current_addr);
        for (line_num, item) in &self.items {
            self.emit(item, *line_num, &mut output)?;
        }

        Ok(output)
    }

    fn process_line(&mut self, line: &'a str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(|c: char| c == ';' || c == '#') {
            Some(idx) => &line[..idx],
            None => line,
        }
        .trim();

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition; a colon after the mnemonic belongs to its operands
        if let Some(colon_idx) = line
            .find(':')
            .filter(|&idx| !line[..idx].trim().contains(char::is_whitespace))
        {
            let label = line[..colon_idx].trim();
            if !is_valid_label(label) {
                return Err(AssemblerError::Syntax {
                    line: line_num,
                    message: format!("invalid label {:?}", label),
                });
            }

            let label = label.to_uppercase();
            if self.symbols.insert(label.clone(), self.current_addr).is_some() {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }

            // Process rest of line if any
            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &'a str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((mnemonic, rest)) => (mnemonic, rest.trim()),
            None => (line, ""),
        };
        let mnemonic = mnemonic.to_uppercase();

        let (item, size) = match mnemonic.as_str() {
            // Directives
            "DB" => {
                if rest.is_empty() || rest.contains(',') {
                    return Err(AssemblerError::Syntax {
                        line: line_num,
                        message: "DB requires exactly one value".into(),
                    });
                }
                (Item::Byte(rest), 1)
            }

            "DS" => {
                if rest.is_empty() {
                    return Err(AssemblerError::Syntax {
                        line: line_num,
                        message: "DS requires text".into(),
                    });
                }
                (Item::Text(rest), rest.len())
            }

            // Instructions
            _ => {
                let info = lookup(&mnemonic).ok_or_else(|| AssemblerError::UnknownMnemonic {
                    line: line_num,
                    mnemonic: mnemonic.clone(),
                })?;

                let operands: Vec<&str> = if rest.is_empty() {
                    Vec::new()
                } else {
                    rest.split(',').map(str::trim).collect()
                };

                if operands.len() != info.operand_count() {
                    return Err(AssemblerError::OperandCount {
                        line: line_num,
                        mnemonic,
                        expected: info.operand_count(),
                        found: operands.len(),
                    });
                }

                (Item::Instr { info, operands }, info.len())
            }
        };

        self.items.push((line_num, item));
        self.current_addr += size;
        Ok(())
    }

    fn emit(&self, item: &Item<'a>, line_num: usize, output: &mut Vec<u8>) -> Result<(), AssemblerError> {
        match item {
            Item::Instr { info, operands } => {
                let mut bytes = Vec::with_capacity(operands.len());
                for (kind, operand) in info.operands.iter().zip(operands) {
                    let value = match kind {
                        Operand::Reg => parse_register(operand, line_num)?,
                        Operand::Imm => self.parse_value(operand, line_num)?,
                    };
                    bytes.push(value);
                }
                output.extend(Instruction::new(*info, &bytes).encode());
            }
            Item::Byte(value) => output.push(self.parse_value(value, line_num)?),
            Item::Text(text) => output.extend_from_slice(text.as_bytes()),
        }
        Ok(())
    }

    fn parse_value(&self, operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
        let invalid = |kind: &str| AssemblerError::Syntax {
            line: line_num,
            message: format!("invalid {} literal {:?}", kind, operand),
        };

        let value = if let Some(hex) = strip_prefix_ci(operand, "0x") {
            i64::from_str_radix(hex, 16).map_err(|_| invalid("hex"))?
        } else if let Some(bin) = strip_prefix_ci(operand, "0b") {
            i64::from_str_radix(bin, 2).map_err(|_| invalid("binary"))?
        } else if operand.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            operand.parse::<i64>().map_err(|_| invalid("decimal"))?
        } else {
            let label = operand.to_uppercase();
            *self.symbols.get(&label).ok_or(AssemblerError::UndefinedLabel {
                line: line_num,
                label,
            })? as i64
        };

        u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })
    }
}

fn strip_prefix_ci<'s>(s: &'s str, prefix: &str) -> Option<&'s str> {
    s.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &s[prefix.len()..])
}

fn parse_register(operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
    operand
        .strip_prefix(|c: char| c == 'R' || c == 'r')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|&n| n < 8)
        .ok_or_else(|| AssemblerError::Syntax {
            line: line_num,
            message: format!("expected register R0-R7, found {:?}", operand),
        })
}

fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("{mnemonic} on line {line} takes {expected} operand(s), found {found}")]
    OperandCount { line: usize, mnemonic: String, expected: usize, found: usize },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("program of {size} bytes does not fit in 256 bytes of memory")]
    ProgramTooLarge { size: usize },
}
