//! LS-8 memory subsystem.
//!
//! A flat array of 256 bytes holding both code and data. Programs load at
//! address 0; the stack grows downward from `0xF4` and the interrupt vector
//! table occupies the last eight cells.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells in the LS-8.
pub const MEMORY_SIZE: usize = 256;

/// Base address of the interrupt vector table (I0 through I7).
pub const VECTOR_TABLE: usize = 0xF8;

/// LS-8 memory: 256 byte cells.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a cell by address.
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[addr as usize]
    }

    /// Write a cell by address.
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Read a cell by an unchecked index, failing past the top of memory.
    pub fn read_checked(&self, index: usize) -> Result<u8, MemoryError> {
        self.cells
            .get(index)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(index))
    }

    /// Copy a program into memory starting at address 0.
    ///
    /// Cells past the end of the program keep their previous contents.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        if program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE,
            });
        }

        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> &[u8] {
        let start = start.min(MEMORY_SIZE);
        let end = (start + count).min(MEMORY_SIZE);
        &self.cells[start..end]
    }

    /// The whole address space as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory address {0} out of range (0-255)")]
    AddressOutOfRange(usize),

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_starts_zeroed() {
        let mem = Memory::new();
        assert!(mem.as_slice().iter().all(|&b| b == 0));
        assert_eq!(mem.as_slice().len(), MEMORY_SIZE);
    }

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(10, 42);
        mem.write(255, 7);
        assert_eq!(mem.read(10), 42);
        assert_eq!(mem.read(255), 7);
    }

    #[test]
    fn test_memory_bounds() {
        let mem = Memory::new();
        assert!(mem.read_checked(255).is_ok());
        assert_eq!(mem.read_checked(256), Err(MemoryError::AddressOutOfRange(256)));
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.write(3, 99);
        mem.load_program(&[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0), 1);
        assert_eq!(mem.read(1), 2);
        assert_eq!(mem.read(2), 3);
        assert_eq!(mem.read(3), 99);
    }

    #[test]
    fn test_load_program_fills_memory_exactly() {
        let mut mem = Memory::new();
        assert!(mem.load_program(&[0xAB; MEMORY_SIZE]).is_ok());
        assert_eq!(mem.read(255), 0xAB);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let err = mem.load_program(&[0; MEMORY_SIZE + 1]).unwrap_err();
        assert_eq!(err, MemoryError::ProgramTooLarge { size: 257, available: 256 });
        assert_eq!(mem.read(0), 0);
    }
}
