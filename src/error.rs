//! Crate-level errors and process exit codes.

use crate::asm::{AssemblerError, ImageError};
use crate::cpu::{MachineError, MemoryError};
use thiserror::Error;

/// Exit status for a program that reached HLT.
pub const EXIT_SUCCESS: u8 = 0;
/// Illegal instruction or any other machine fault.
pub const EXIT_ILLEGAL_INSTRUCTION: u8 = 1;
/// Bad command-line invocation (clap's own exit code).
pub const EXIT_USAGE: u8 = 2;
/// The program could not be read, parsed or assembled.
pub const EXIT_INVALID_SOURCE: u8 = 3;
/// The program does not fit in memory.
pub const EXIT_PROGRAM_TOO_LARGE: u8 = 4;
/// DIV or MOD by a zero register.
pub const EXIT_DIVISION_BY_ZERO: u8 = 5;
/// The configured cycle limit was reached before HLT.
pub const EXIT_CYCLE_LIMIT: u8 = 6;

/// Anything that can stop a program from running to HLT.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("invalid source: {0}")]
    InvalidSource(#[from] ImageError),

    #[error("invalid source: {0}")]
    Assembly(#[from] AssemblerError),

    #[error("cannot load program: {0}")]
    Load(#[from] MemoryError),

    #[error(transparent)]
    Machine(#[from] MachineError),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidSource(_) | Error::Assembly(_) => EXIT_INVALID_SOURCE,
            Error::Load(MemoryError::ProgramTooLarge { .. }) => EXIT_PROGRAM_TOO_LARGE,
            Error::Load(MemoryError::AddressOutOfRange(_)) => EXIT_ILLEGAL_INSTRUCTION,
            Error::Machine(e) => e.exit_code(),
        }
    }
}

impl MachineError {
    /// Process exit code for this fault.
    pub fn exit_code(&self) -> u8 {
        match self {
            MachineError::DivisionByZero { .. } => EXIT_DIVISION_BY_ZERO,
            MachineError::CycleLimit(_) => EXIT_CYCLE_LIMIT,
            _ => EXIT_ILLEGAL_INSTRUCTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ILLEGAL_INSTRUCTION,
            EXIT_USAGE,
            EXIT_INVALID_SOURCE,
            EXIT_PROGRAM_TOO_LARGE,
            EXIT_DIVISION_BY_ZERO,
            EXIT_CYCLE_LIMIT,
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_error_exit_codes() {
        let illegal = Error::from(MachineError::IllegalInstruction { addr: 4, opcode: 0xFF });
        assert_eq!(illegal.exit_code(), EXIT_ILLEGAL_INSTRUCTION);

        let div = Error::from(MachineError::DivisionByZero { addr: 6, opcode: 0xA3 });
        assert_eq!(div.exit_code(), EXIT_DIVISION_BY_ZERO);

        let too_large = Error::from(MemoryError::ProgramTooLarge { size: 300, available: 256 });
        assert_eq!(too_large.exit_code(), EXIT_PROGRAM_TOO_LARGE);

        let bad_addr = Error::from(MemoryError::AddressOutOfRange(256));
        assert_eq!(bad_addr.exit_code(), EXIT_ILLEGAL_INSTRUCTION);

        let missing = Error::from(ImageError::Io("no such file".into()));
        assert_eq!(missing.exit_code(), EXIT_INVALID_SOURCE);
    }
}
