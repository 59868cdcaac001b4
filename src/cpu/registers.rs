//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: eight 8-bit general purpose registers
//! - R5 doubles as IM (interrupt mask), R6 as IS (interrupt status)
//!   and R7 as SP (stack pointer)
//! - PC: 8-bit program counter
//! - FL: flags register, `00000LGE`
//! - IE: interrupt-enable bit

use bitflags::bitflags;
use serde::{Serialize, Deserialize};

/// Number of general purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Interrupt mask register.
pub const IM: usize = 5;
/// Interrupt status register.
pub const IS: usize = 6;
/// Stack pointer register.
pub const SP: usize = 7;

/// Initial stack pointer: the stack grows down from just below the
/// key buffer and interrupt vectors.
pub const SP_INIT: u8 = 0xF4;

bitflags! {
    /// Comparison flags, set only by CMP.
    #[derive(Default, Serialize, Deserialize)]
    pub struct Flags: u8 {
        const E = 0b0000_0001;
        const G = 0b0000_0010;
        const L = 0b0000_0100;
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bit = |flag: Flags, c: char| if self.contains(flag) { c } else { '-' };
        write!(f, "{}{}{}", bit(Flags::L, 'L'), bit(Flags::G, 'G'), bit(Flags::E, 'E'))
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7.
    pub r: [u8; NUM_REGISTERS],

    /// Program counter.
    pub pc: u8,

    /// Comparison flags.
    pub fl: Flags,

    /// Interrupts are accepted while set. Cleared while an interrupt
    /// handler runs and restored by IRET.
    pub ie: bool,
}

impl Registers {
    /// Create a register file in its power-on state: everything zero
    /// except SP, and interrupts enabled (but fully masked by IM).
    pub fn new() -> Self {
        let mut r = [0; NUM_REGISTERS];
        r[SP] = SP_INIT;
        Self {
            r,
            pc: 0,
            fl: Flags::empty(),
            ie: true,
        }
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> u8 {
        self.r[SP]
    }

    /// Set the stack pointer.
    #[inline]
    pub fn set_sp(&mut self, value: u8) {
        self.r[SP] = value;
    }

    /// Pending, unmasked interrupts.
    pub fn pending_interrupts(&self) -> u8 {
        self.r[IM] & self.r[IS]
    }

    /// Raise interrupt `n` (0-7) in the status register.
    pub fn raise_interrupt(&mut self, n: u8) {
        self.r[IS] |= 1 << (n & 7);
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let regs = Registers::new();
        assert_eq!(regs.r, [0, 0, 0, 0, 0, 0, 0, 0xF4]);
        assert_eq!(regs.pc, 0);
        assert!(regs.fl.is_empty());
        assert!(regs.ie);
        assert_eq!(regs.pending_interrupts(), 0);
    }

    #[test]
    fn test_flag_bits() {
        assert_eq!(Flags::E.bits(), 0b001);
        assert_eq!(Flags::G.bits(), 0b010);
        assert_eq!(Flags::L.bits(), 0b100);
        assert_eq!(Flags::from_bits_truncate(0xFF), Flags::all());
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(Flags::empty().to_string(), "---");
        assert_eq!(Flags::E.to_string(), "--E");
        assert_eq!((Flags::L | Flags::E).to_string(), "L-E");
    }

    #[test]
    fn test_interrupts_masked() {
        let mut regs = Registers::new();
        regs.raise_interrupt(2);
        assert_eq!(regs.r[IS], 0b100);
        assert_eq!(regs.pending_interrupts(), 0);

        regs.r[IM] = 0b100;
        assert_eq!(regs.pending_interrupts(), 0b100);
    }

    #[test]
    fn test_raise_interrupt_masks_number() {
        let mut regs = Registers::new();
        regs.raise_interrupt(9);
        assert_eq!(regs.r[IS], 0b10);
    }
}
