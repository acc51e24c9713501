//! Fail-fast runtime traps — the Rust model of `spec.md` §7's run-time
//! error plane.
//!
//! Every category there (arithmetic, bounds, resource, contract,
//! environment-parse) is eager and unrecoverable: a trap prints one line
//! to stderr and exits the process with status 1. There is no catch path
//! for emitted code, so this module's sole job is formatting the
//! category-specific message and calling [`std::process::exit`].
//!
//! Library consumers that want the underlying condition without tearing
//! down the process (e.g. `emberc-codegen`'s constant folder, which must
//! *refuse* to fold a div-by-zero rather than trap at compile time) use
//! [`crate::error::Error`] and its `Result` instead; `trap` is reserved
//! for the emitted-program-equivalent path exercised by integration
//! tests.

use crate::error::Error;

/// Prints the trap message for `err` and exits with status 1, exactly as
/// the emitted C's `rt_<op>` calls do.
///
/// Never returns.
pub fn raise(err: &Error) -> ! {
    eprintln!("{err}");
    std::process::exit(1)
}

/// Checked addition: traps on overflow in CHECKED arithmetic mode
/// (`spec.md` §4.5).
pub fn checked_add(a: i64, b: i64) -> i64 {
    a.checked_add(b)
        .unwrap_or_else(|| raise(&Error::ArithmeticOverflow { op: "add" }))
}

/// Checked subtraction.
pub fn checked_sub(a: i64, b: i64) -> i64 {
    a.checked_sub(b)
        .unwrap_or_else(|| raise(&Error::ArithmeticOverflow { op: "sub" }))
}

/// Checked multiplication.
pub fn checked_mul(a: i64, b: i64) -> i64 {
    a.checked_mul(b)
        .unwrap_or_else(|| raise(&Error::ArithmeticOverflow { op: "mul" }))
}

/// Checked negation.
pub fn checked_neg(a: i64) -> i64 {
    a.checked_neg()
        .unwrap_or_else(|| raise(&Error::ArithmeticOverflow { op: "neg" }))
}

/// Integer division: traps on division by zero regardless of arithmetic
/// mode (`spec.md` §4.5 — "division and modulo *still* use runtime calls
/// because zero-check is required for defined behavior").
pub fn div(a: i64, b: i64) -> i64 {
    if b == 0 {
        raise(&Error::DivisionByZero { op: "div" });
    }
    a.wrapping_div(b)
}

/// Integer modulo: traps on modulo by zero.
pub fn rem(a: i64, b: i64) -> i64 {
    if b == 0 {
        raise(&Error::DivisionByZero { op: "mod" });
    }
    a.wrapping_rem(b)
}

/// Double division: traps only on divide-by-zero (IEEE overflow to
/// infinity is not a trap condition for floating point).
pub fn fdiv(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        raise(&Error::DivisionByZero { op: "fdiv" });
    }
    a / b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_ops_pass_through_in_range_values() {
        assert_eq!(checked_add(2, 3), 5);
        assert_eq!(checked_sub(5, 3), 2);
        assert_eq!(checked_mul(4, 5), 20);
        assert_eq!(checked_neg(4), -4);
    }

    #[test]
    fn div_and_rem_on_nonzero_divisor() {
        assert_eq!(div(7, 2), 3);
        assert_eq!(rem(7, 2), 1);
    }

    #[test]
    fn fdiv_on_nonzero_divisor() {
        assert_eq!(fdiv(7.0, 2.0), 3.5);
    }
}
