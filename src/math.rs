//! Saturating arithmetic helpers for read-only ledger queries
//!
//! Mutating operations use checked math and fail with `Overflow` instead.

/// Add u128 with saturation at MAX
#[inline]
pub fn add_u128(a: u128, b: u128) -> u128 {
    a.saturating_add(b)
}

/// Subtract u128 with saturation at 0
#[inline]
pub fn sub_u128(a: u128, b: u128) -> u128 {
    a.saturating_sub(b)
}

/// Multiply u128 with saturation
#[inline]
pub fn mul_u128(a: u128, b: u128) -> u128 {
    a.saturating_mul(b)
}

/// Divide u128, `None` when the divisor is zero
#[inline]
pub fn div_u128(a: u128, b: u128) -> Option<u128> {
    if b == 0 {
        None
    } else {
        Some(a / b)
    }
}

/// Apply a signed delta to an unsigned total, saturating at both ends
#[inline]
pub fn apply_delta(total: u128, delta: i128) -> u128 {
    if delta >= 0 {
        add_u128(total, delta.unsigned_abs())
    } else {
        sub_u128(total, delta.unsigned_abs())
    }
}

/// Convert an amount to a signed delta, `None` above i128::MAX
#[inline]
pub fn to_delta(amount: u128) -> Option<i128> {
    i128::try_from(amount).ok()
}
