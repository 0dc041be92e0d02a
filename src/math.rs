// 1.3 math.rs: checked fixed point helpers. every ledger mutation goes through these so
// an overflow aborts the operation instead of wrapping.

use num::BigUint;
use num_traits::ToPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,
}

pub fn checked_add(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn checked_sub(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

pub fn checked_mul(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

pub fn checked_div(a: u128, b: u128) -> Result<u128, MathError> {
    if b == 0 {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}

// a * b / c rounded down. falls back to a wide intermediate when a * b does not fit,
// share mints multiply two 18 decimal supplies.
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, MathError> {
    if c == 0 {
        return Err(MathError::DivisionByZero);
    }
    match a.checked_mul(b) {
        Some(product) => Ok(product / c),
        None => {
            let wide = BigUint::from(a) * BigUint::from(b) / BigUint::from(c);
            wide.to_u128().ok_or(MathError::Overflow)
        }
    }
}

pub fn pow10(exp: u32) -> Result<u128, MathError> {
    10u128.checked_pow(exp).ok_or(MathError::Overflow)
}

pub fn abs_diff(a: u128, b: u128) -> u128 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_small() {
        assert_eq!(mul_div(10, 20, 3).unwrap(), 66);
        assert_eq!(mul_div(0, 20, 3).unwrap(), 0);
    }

    #[test]
    fn mul_div_wide_intermediate() {
        // 1e21 * 1e21 overflows u128 but the quotient fits
        let a = 1_000_000_000_000_000_000_000u128;
        assert_eq!(mul_div(a, a, a).unwrap(), a);
    }

    #[test]
    fn mul_div_overflowing_result() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(MathError::Overflow));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(mul_div(1, 1, 0), Err(MathError::DivisionByZero));
        assert_eq!(checked_div(1, 0), Err(MathError::DivisionByZero));
    }

    #[test]
    fn checked_ops() {
        assert_eq!(checked_sub(1, 2), Err(MathError::Underflow));
        assert_eq!(checked_add(u128::MAX, 1), Err(MathError::Overflow));
        assert_eq!(abs_diff(3, 10), 7);
        assert_eq!(pow10(18).unwrap(), 1_000_000_000_000_000_000);
    }
}
