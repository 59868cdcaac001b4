//! The `.ls8` program image format.
//!
//! A plain text format:
//! - One byte per line, written as 8 binary digits
//! - Anything after `#` is a comment
//! - Blank lines are ignored

use crate::asm::disasm::disassemble_at;
use std::path::Path;
use thiserror::Error;

/// Parse the text of an `.ls8` image.
pub fn parse_image(text: &str) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let content = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        }
        .trim();

        if content.is_empty() {
            continue;
        }

        if content.len() != 8 || !content.chars().all(|c| c == '0' || c == '1') {
            return Err(ImageError::Parse {
                line: line_num + 1,
                message: format!("expected 8 binary digits, found {:?}", content),
            });
        }

        // Eight validated binary digits always fit in a byte.
        let byte = u8::from_str_radix(content, 2).map_err(|e| ImageError::Parse {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        bytes.push(byte);
    }

    Ok(bytes)
}

/// Load an `.ls8` image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ImageError::Io(format!("{}: {}", path.display(), e)))?;
    parse_image(&text)
}

/// Render bytes as an `.ls8` image, annotating each instruction.
pub fn format_image(bytes: &[u8]) -> String {
    let mut text = String::new();
    text.push_str("# LS-8 program image\n");
    text.push_str(&format!("# {} bytes\n\n", bytes.len()));

    let mut addr = 0;
    while addr < bytes.len() {
        let (line, len) = disassemble_at(bytes, addr);
        for (i, byte) in bytes[addr..addr + len].iter().enumerate() {
            if i == 0 {
                text.push_str(&format!("{:08b} # {:02X}: {}\n", byte, addr, line));
            } else {
                text.push_str(&format!("{:08b}\n", byte));
            }
        }
        addr += len;
    }

    text
}

/// Save bytes to disk as an `.ls8` image.
pub fn save_image<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), ImageError> {
    let path = path.as_ref();
    std::fs::write(path, format_image(bytes))
        .map_err(|e| ImageError::Io(format!("{}: {}", path.display(), e)))
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRINT8: &str = "\
# print8.ls8
10000010 # LDI R0,8
00000000
00001000

01000111 # PRN R0
00000000
00000001 # HLT
";

    #[test]
    fn test_parse_print8() {
        let bytes = parse_image(PRINT8).unwrap();
        assert_eq!(bytes, vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
    }

    #[test]
    fn test_parse_rejects_bad_line() {
        let err = parse_image("10000010\n1000001\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 2, .. }));

        let err = parse_image("1000001x\n").unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_image("# nothing here\n\n   \n").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_format_is_parseable() {
        let bytes = vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01];
        let text = format_image(&bytes);
        assert!(text.contains("10000010 # 00: LDI R0,8"));
        assert!(text.contains("00000001 # 05: HLT"));
        assert_eq!(parse_image(&text).unwrap(), bytes);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("/definitely/not/here.ls8").unwrap_err();
        assert!(matches!(err, ImageError::Io(_)));
    }
}
