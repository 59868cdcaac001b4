//! Disassembler for LS-8 programs.
//!
//! Converts machine code back to readable assembly.

use crate::cpu::decode::{decode, Instruction};

/// Disassemble the instruction starting at `addr`.
///
/// Returns the text and the number of bytes consumed. Bytes that are not
/// a valid opcode, or an opcode whose operands run past the end of
/// `bytes`, are rendered as a single `DB` byte.
pub fn disassemble_at(bytes: &[u8], addr: usize) -> (String, usize) {
    let Some(&opcode) = bytes.get(addr) else {
        return (String::new(), 0);
    };

    match decode(opcode) {
        Ok(info) if addr + info.len() <= bytes.len() => {
            let instr = Instruction::new(info, &bytes[addr + 1..addr + info.len()]);
            (instr.to_string(), info.len())
        }
        _ => (format!("DB 0x{:02X}", opcode), 1),
    }
}

/// Disassemble a whole program into an address-prefixed listing.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; -----------------\n\n");

    let mut addr = 0;
    while addr < bytes.len() {
        let (line, len) = disassemble_at(bytes, addr);
        let raw: Vec<String> = bytes[addr..addr + len]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        output.push_str(&format!("{:02X}: {:<12} ; {}\n", addr, line, raw.join(" ")));
        addr += len;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_hlt() {
        assert_eq!(disassemble_at(&[0x01], 0), ("HLT".to_string(), 1));
    }

    #[test]
    fn test_disassemble_ldi() {
        let (text, len) = disassemble_at(&[0x00, 0x82, 0x03, 0xFF], 1);
        assert_eq!(text, "LDI R3,255");
        assert_eq!(len, 3);
    }

    #[test]
    fn test_disassemble_unknown_byte() {
        assert_eq!(disassemble_at(&[0xFF], 0), ("DB 0xFF".to_string(), 1));
    }

    #[test]
    fn test_disassemble_truncated_operands() {
        assert_eq!(disassemble_at(&[0xA0, 0x01], 0), ("DB 0xA0".to_string(), 1));
    }

    #[test]
    fn test_listing() {
        let listing = disassemble(&[0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
        assert!(listing.contains("00: LDI R0,8"));
        assert!(listing.contains("03: PRN R0"));
        assert!(listing.contains("05: HLT"));
        assert!(listing.contains("; 82 00 08"));
    }
}
