//! AMM Model - constant product (x·y=k) price quoting
//!
//! Quotes collateral/debt swaps against a Uniswap-v2 style pool with a 0.3%
//! input fee. Quoting is a pure function of the reserves: no swap is ever
//! executed, so reserves never move. Independent of the lending engine;
//! agents may use it to value collateral.

pub mod math;
pub mod pool;

pub use math::get_amount_out;
pub use pool::{PoolConfig, SwapPool};

use thiserror::Error;

/// Fee numerator applied to the input amount (997/1000 = 0.3% fee)
pub const FEE_NUMERATOR: f64 = 997.0;

/// Fee denominator
pub const FEE_DENOMINATOR: f64 = 1000.0;

/// Error types for AMM operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmmError {
    /// Invalid reserves (zero, negative or not finite)
    #[error("reserves must be positive and finite")]
    InvalidReserves,
    /// Invalid amount (negative or not finite)
    #[error("amount must be non-negative and finite")]
    InvalidAmount,
    /// Operation is declared but not implemented
    #[error("operation not yet supported")]
    NotYetSupported,
}
