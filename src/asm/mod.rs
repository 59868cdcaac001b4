//! Assembler, disassembler and image format for LS-8 programs.
//!
//! This module provides:
//! - A two-pass assembler (text → machine code)
//! - A disassembler (machine code → readable text)
//! - The `.ls8` image format (one byte per line, in binary)

pub mod assembler;
pub mod disasm;
pub mod image;

use std::path::Path;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_at};
pub use image::{load_image, parse_image, save_image, ImageError};

/// Read a program from disk: `.asm` files are assembled, anything else is
/// parsed as an `.ls8` image.
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, crate::Error> {
    let path = path.as_ref();
    let is_asm = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("asm"));

    if is_asm {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ImageError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(assemble(&source)?)
    } else {
        Ok(load_image(path)?)
    }
}
