//! Constant product quote with fee on input

use crate::{AmmError, FEE_DENOMINATOR, FEE_NUMERATOR};

/// Output amount for swapping `amount_in` into a pool
///
/// With fee on input:
/// - in_with_fee = amount_in · 997
/// - out = in_with_fee · reserve_out / (reserve_in · 1000 + in_with_fee)
///
/// The quote is always strictly below `reserve_out`. For very large inputs
/// the f64 sum absorbs `reserve_in · 1000` and the raw ratio rounds to the
/// full reserve, so the result is clamped to the largest f64 under it.
///
/// # Arguments
/// * `amount_in` - Amount paid into the pool
/// * `reserve_in` - Reserve of the token paid in
/// * `reserve_out` - Reserve of the token paid out
pub fn get_amount_out(amount_in: f64, reserve_in: f64, reserve_out: f64) -> Result<f64, AmmError> {
    if !valid_reserve(reserve_in) || !valid_reserve(reserve_out) {
        return Err(AmmError::InvalidReserves);
    }
    if !amount_in.is_finite() || amount_in < 0.0 {
        return Err(AmmError::InvalidAmount);
    }

    let in_with_fee = amount_in * FEE_NUMERATOR;
    let numerator = in_with_fee * reserve_out;
    let denominator = reserve_in * FEE_DENOMINATOR + in_with_fee;

    Ok((numerator / denominator).min(just_below(reserve_out)))
}

/// Largest f64 strictly less than a positive finite `x`
fn just_below(x: f64) -> f64 {
    f64::from_bits(x.to_bits() - 1)
}

pub(crate) fn valid_reserve(r: f64) -> bool {
    r.is_finite() && r > 0.0
}
