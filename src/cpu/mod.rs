//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 bytes of memory holding code, data, stack and interrupt vectors
//! - 8 general purpose registers, a program counter and a flags register
//! - 34-instruction set with a table-driven decoder

pub mod memory;
pub mod registers;
pub mod decode;
pub mod alu;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Flags, Registers};
pub use decode::{Instruction, Op, AluOp, OpcodeInfo, DecodeError};
pub use execute::{Machine, MachineConfig, MachineError, MachineState, AddressPolicy};
