//! Collateral/debt swap pool (quoting only)

use serde::{Deserialize, Serialize};

use crate::math::{get_amount_out, valid_reserve};
use crate::AmmError;

/// Starting reserves for a pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Collateral reserve (x)
    pub reserve_x: f64,
    /// Debt-token reserve (y)
    pub reserve_y: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            reserve_x: 1_000.0,
            reserve_y: 1_000_000.0,
        }
    }
}

/// Constant product pool over (collateral = x, debt token = y)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapPool {
    reserve_x: f64,
    reserve_y: f64,
    /// LP shares outstanding. Stays zero until LP mint/burn exists.
    total_liquidity_supply: f64,
}

impl SwapPool {
    pub fn new(reserve_x: f64, reserve_y: f64) -> Result<Self, AmmError> {
        if !valid_reserve(reserve_x) || !valid_reserve(reserve_y) {
            return Err(AmmError::InvalidReserves);
        }
        Ok(Self {
            reserve_x,
            reserve_y,
            total_liquidity_supply: 0.0,
        })
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self, AmmError> {
        Self::new(config.reserve_x, config.reserve_y)
    }

    pub fn reserves(&self) -> (f64, f64) {
        (self.reserve_x, self.reserve_y)
    }

    pub fn total_liquidity_supply(&self) -> f64 {
        self.total_liquidity_supply
    }

    /// Invariant x·y
    pub fn k(&self) -> f64 {
        self.reserve_x * self.reserve_y
    }

    /// Marginal price of x in units of y, before fees
    pub fn spot_price(&self) -> f64 {
        self.reserve_y / self.reserve_x
    }

    /// Quote the output of swapping `amount` in
    ///
    /// `is_x = true` pays x in and quotes y out; `false` reverses the pair.
    /// Does not mutate reserves.
    pub fn get_price_out(&self, is_x: bool, amount: f64) -> Result<f64, AmmError> {
        if is_x {
            get_amount_out(amount, self.reserve_x, self.reserve_y)
        } else {
            get_amount_out(amount, self.reserve_y, self.reserve_x)
        }
    }

    /// Add liquidity. A completion must mint shares in proportion to the
    /// reserve contribution and keep the x/y ratio within fee tolerance.
    pub fn lp(&mut self, _amount_x: f64, _amount_y: f64) -> Result<f64, AmmError> {
        Err(AmmError::NotYetSupported)
    }

    /// Burn LP shares for a proportional slice of both reserves
    pub fn withdraw_lp(&mut self, _shares: f64) -> Result<(f64, f64), AmmError> {
        Err(AmmError::NotYetSupported)
    }
}
