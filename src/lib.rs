//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a small 8-bit register machine.
//!
//! The LS-8 has 256 bytes of memory, eight 8-bit registers, a program
//! counter and a three-bit flags register. Programs are loaded at address
//! 0 and run until HLT or a fault.

pub mod cpu;
pub mod asm;
pub mod error;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Machine, MachineConfig, MachineError, MachineState, AddressPolicy, Memory, Registers, Flags, Instruction};
pub use asm::{assemble, disassemble, load_image, load_source, parse_image, save_image, AssemblerError, ImageError};
pub use error::Error;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
