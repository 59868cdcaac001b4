//! WebAssembly bindings for the LS-8 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::Machine;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_at;
use crate::asm::image::parse_image;
use crate::cpu::memory::MEMORY_SIZE;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    program: Vec<u8>,
    output: Vec<u8>,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a new machine instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(),
            program: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Load a program from assembly source code. Returns its size in bytes.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let bytes = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_bytes(bytes)
    }

    /// Load a program from `.ls8` image text. Returns its size in bytes.
    #[wasm_bindgen]
    pub fn load_image(&mut self, text: &str) -> Result<usize, JsError> {
        let bytes = parse_image(text)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_bytes(bytes)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.machine.step(&mut self.output)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(instr.to_string())
    }

    /// Run until halt or max cycles. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.machine.run_limited(&mut self.output, max_cycles as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.machine.cycles)
    }

    /// Reset the machine to initial state with the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.load_bytes(self.program.clone())?;
        Ok(())
    }

    /// Console output produced so far.
    #[wasm_bindgen]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.machine.is_running()
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.machine.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.machine.regs.pc
    }

    /// Get a general purpose register (0-7).
    #[wasm_bindgen]
    pub fn register(&self, index: usize) -> u8 {
        self.machine.regs.r.get(index).copied().unwrap_or(0)
    }

    /// Get the flags register.
    #[wasm_bindgen]
    pub fn flags(&self) -> u8 {
        self.machine.regs.fl.bits()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.machine.state)
    }

    /// Get memory cell value at an address.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: u8) -> u8 {
        self.machine.mem.read(addr)
    }

    /// Get all memory.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.machine.mem.dump(0, MEMORY_SIZE))
    }

    /// Get the full machine state as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl WasmMachine {
    fn load_bytes(&mut self, bytes: Vec<u8>) -> Result<usize, JsError> {
        let mut machine = Machine::new();
        machine.load(&bytes)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = bytes.len();
        self.machine = machine;
        self.program = bytes;
        self.output.clear();
        Ok(len)
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the program size in bytes.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let bytes = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(bytes.len())
}

/// Disassemble the instruction at the start of `bytes`.
#[wasm_bindgen]
pub fn wasm_disassemble(bytes: &[u8]) -> String {
    disassemble_at(bytes, 0).0
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRINT8: &str = "10000010\n00000000\n00001000\n01000111\n00000000\n00000001\n";

    #[test]
    fn test_reset_reloads_program() {
        let mut wasm = WasmMachine::new();
        assert_eq!(wasm.load_image(PRINT8).ok(), Some(6));
        assert!(wasm.run(100).is_ok());
        assert!(wasm.is_halted());
        assert_eq!(wasm.output(), "8\n");

        assert!(wasm.reset().is_ok());
        assert!(wasm.is_running());
        assert_eq!(wasm.pc(), 0);
        assert_eq!(wasm.output(), "");
        assert_eq!(wasm.memory_at(0), 0x82);
        assert_eq!(wasm.cycles(), 0);
    }

    #[test]
    fn test_reset_without_program() {
        let mut wasm = WasmMachine::new();
        assert!(wasm.reset().is_ok());
        assert_eq!(wasm.memory_at(0), 0);
        assert_eq!(wasm.register(7), 0xF4);
    }
}
