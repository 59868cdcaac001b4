//! The LS-8 arithmetic logic unit.
//!
//! All operations work on unsigned 8-bit values and wrap modulo 256.
//! The ALU is pure: the machine decides where results are written.

use crate::cpu::decode::AluOp;
use crate::cpu::registers::Flags;
use thiserror::Error;

/// Result of an ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOutput {
    /// New value for the first register.
    Value(u8),
    /// New contents of the flags register (CMP).
    Compare(Flags),
}

/// Execute `op` on register values `a` and `b`.
///
/// One-register forms (INC, DEC, NOT) ignore `b`.
pub fn execute(op: AluOp, a: u8, b: u8) -> Result<AluOutput, AluError> {
    let value = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Div => a.checked_div(b).ok_or(AluError::DivisionByZero)?,
        AluOp::Mod => a.checked_rem(b).ok_or(AluError::DivisionByZero)?,
        AluOp::Inc => a.wrapping_add(1),
        AluOp::Dec => a.wrapping_sub(1),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Not => !a,
        // Logical shifts; shifting by the full width or more clears the value.
        AluOp::Shl => a.checked_shl(b as u32).unwrap_or(0),
        AluOp::Shr => a.checked_shr(b as u32).unwrap_or(0),
        AluOp::Cmp => return Ok(AluOutput::Compare(compare(a, b))),
    };
    Ok(AluOutput::Value(value))
}

/// Compare two values. Exactly one flag is set.
pub fn compare(a: u8, b: u8) -> Flags {
    match a.cmp(&b) {
        std::cmp::Ordering::Equal => Flags::E,
        std::cmp::Ordering::Less => Flags::L,
        std::cmp::Ordering::Greater => Flags::G,
    }
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("division by zero")]
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn value(op: AluOp, a: u8, b: u8) -> u8 {
        match execute(op, a, b) {
            Ok(AluOutput::Value(v)) => v,
            other => panic!("expected a value from {:?}, got {:?}", op, other),
        }
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(value(AluOp::Add, 200, 100), 44);
        assert_eq!(value(AluOp::Sub, 3, 5), 254);
        assert_eq!(value(AluOp::Mul, 16, 17), 16);
        assert_eq!(value(AluOp::Inc, 255, 0), 0);
        assert_eq!(value(AluOp::Dec, 0, 0), 255);
    }

    #[test]
    fn test_division() {
        assert_eq!(value(AluOp::Div, 10, 3), 3);
        assert_eq!(value(AluOp::Mod, 10, 3), 1);
        assert_eq!(execute(AluOp::Div, 5, 0), Err(AluError::DivisionByZero));
        assert_eq!(execute(AluOp::Mod, 5, 0), Err(AluError::DivisionByZero));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(value(AluOp::And, 0b1100, 0b1010), 0b1000);
        assert_eq!(value(AluOp::Or, 0b1100, 0b1010), 0b1110);
        assert_eq!(value(AluOp::Xor, 0b1100, 0b1010), 0b0110);
        assert_eq!(value(AluOp::Not, 0b1111_0000, 0), 0b0000_1111);
    }

    #[test]
    fn test_shifts_are_logical() {
        assert_eq!(value(AluOp::Shl, 0b1000_0001, 1), 0b0000_0010);
        assert_eq!(value(AluOp::Shr, 0b1000_0001, 1), 0b0100_0000);
        assert_eq!(value(AluOp::Shl, 0xFF, 8), 0);
        assert_eq!(value(AluOp::Shr, 0xFF, 200), 0);
        assert_eq!(value(AluOp::Shr, 0xFF, 0), 0xFF);
    }

    #[test]
    fn test_compare() {
        assert_eq!(execute(AluOp::Cmp, 4, 4), Ok(AluOutput::Compare(Flags::E)));
        assert_eq!(execute(AluOp::Cmp, 3, 4), Ok(AluOutput::Compare(Flags::L)));
        assert_eq!(execute(AluOp::Cmp, 5, 4), Ok(AluOutput::Compare(Flags::G)));
    }

    proptest! {
        #[test]
        fn prop_add_sub_mul_mod_256(a in any::<u8>(), b in any::<u8>()) {
            prop_assert_eq!(value(AluOp::Add, a, b) as u32, (a as u32 + b as u32) % 256);
            prop_assert_eq!(value(AluOp::Sub, a, b) as i32, (a as i32 - b as i32).rem_euclid(256));
            prop_assert_eq!(value(AluOp::Mul, a, b) as u32, (a as u32 * b as u32) % 256);
        }

        #[test]
        fn prop_div_mod(a in any::<u8>(), b in 1u8..=255) {
            prop_assert_eq!(value(AluOp::Div, a, b), a / b);
            prop_assert_eq!(value(AluOp::Mod, a, b), a % b);
            prop_assert_eq!(value(AluOp::Div, a, b) as u32 * b as u32 + value(AluOp::Mod, a, b) as u32, a as u32);
        }

        #[test]
        fn prop_compare_sets_exactly_one_flag(a in any::<u8>(), b in any::<u8>()) {
            let flags = compare(a, b);
            prop_assert_eq!(flags.bits().count_ones(), 1);
            prop_assert_eq!(flags.contains(Flags::E), a == b);
            prop_assert_eq!(flags.contains(Flags::L), a < b);
            prop_assert_eq!(flags.contains(Flags::G), a > b);
        }

        #[test]
        fn prop_compare_self_is_equal(x in any::<u8>()) {
            prop_assert_eq!(compare(x, x), Flags::E);
        }

        #[test]
        fn prop_not_is_involution(a in any::<u8>()) {
            prop_assert_eq!(value(AluOp::Not, value(AluOp::Not, a, 0), 0), a);
        }
    }
}
