//! Global ledger and price feed

use crate::error::{CdpError, Result};
use crate::math::*;
use crate::params::{Params, PRICE_SCALE};

/// Oracle price of one collateral base unit in debt base units
///
/// Every solvency check reads the price at the moment of the check, so a
/// single write can flip any number of positions in the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceFeed {
    /// Current price (scaled by PRICE_SCALE)
    price: u128,

    /// Simulated time of the last oracle write
    updated_at: u64,
}

impl PriceFeed {
    pub fn new(price: u128) -> Self {
        Self { price, updated_at: 0 }
    }

    pub fn get_price(&self) -> u128 {
        self.price
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// Oracle write. No staleness or bounds check; zero is accepted.
    pub fn set_price(&mut self, price: u128, now: u64) {
        self.price = price;
        self.updated_at = now;
    }
}

/// Global ledger shared by every position in a simulation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct System {
    /// Sum of deposits over all live positions
    pub total_deposits: u128,

    /// Sum of debt over all live positions
    pub total_debt: u128,

    /// Collateral price oracle
    pub feed: PriceFeed,

    /// Simulated seconds since start
    pub time: u64,

    /// Completed scheduler passes
    pub turn: u64,

    pub params: Params,
}

impl System {
    pub fn new(params: Params) -> Self {
        Self {
            total_deposits: 0,
            total_debt: 0,
            feed: PriceFeed::new(u128::from(params.initial_feed)),
            time: 0,
            turn: 0,
            params,
        }
    }

    // ========================================
    // Aggregate updates (trusted callers only)
    // ========================================

    /// Add a signed delta to total deposits. Positions keep the invariant.
    pub fn update_deposits(&mut self, delta: i128) {
        self.total_deposits = apply_delta(self.total_deposits, delta);
    }

    /// Add a signed delta to total debt. Positions keep the invariant.
    pub fn update_debt(&mut self, delta: i128) {
        self.total_debt = apply_delta(self.total_debt, delta);
    }

    // ========================================
    // Solvency
    // ========================================

    pub fn get_feed(&self) -> u128 {
        self.feed.get_price()
    }

    /// Global collateral ratio in basis points: total_debt * max_bps / total_deposits
    pub fn global_collateral_ratio(&self) -> Result<u128> {
        let scaled = mul_u128(self.total_debt, u128::from(self.params.max_bps));
        div_u128(scaled, self.total_deposits).ok_or(CdpError::UndefinedRatio)
    }

    /// total_deposits * feed, in debt base units
    pub fn global_max_borrow(&self) -> u128 {
        max_borrow_for(self.total_deposits, self.get_feed())
    }

    /// Strictly `total_debt < global_max_borrow()`
    pub fn is_solvent(&self) -> bool {
        solvent_at(self.total_debt, self.total_deposits, self.get_feed())
    }

    /// Solvency of prospective totals at the current feed
    pub(crate) fn would_be_solvent(&self, total_debt: u128, total_deposits: u128) -> bool {
        solvent_at(total_debt, total_deposits, self.get_feed())
    }

    /// Circuit-breaker state. No trigger is defined yet.
    pub fn is_in_emergency_mode(&self) -> bool {
        false
    }

    // ========================================
    // Privileged writes
    // ========================================

    pub fn set_feed(&mut self, price: u128) {
        log::info!("feed updated {} -> {} at t={}", self.get_feed(), price, self.time);
        self.feed.set_price(price, self.time);
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.time = self.time.saturating_add(seconds);
    }

    pub fn next_turn(&mut self) {
        self.turn = self.turn.saturating_add(1);
    }
}

/// deposits * feed / PRICE_SCALE
pub(crate) fn max_borrow_for(deposits: u128, feed: u128) -> u128 {
    mul_u128(deposits, feed) / u128::from(PRICE_SCALE)
}

/// `debt < deposits * feed` without rounding: debt * PRICE_SCALE < deposits * feed
pub(crate) fn solvent_at(debt: u128, deposits: u128, feed: u128) -> bool {
    mul_u128(debt, u128::from(PRICE_SCALE)) < mul_u128(deposits, feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> System {
        System::new(Params::default())
    }

    #[test]
    fn test_new_system_is_empty() {
        let s = system();
        assert_eq!(s.total_deposits, 0);
        assert_eq!(s.total_debt, 0);
        assert_eq!(s.get_feed(), 1_000 * u128::from(PRICE_SCALE));
        assert_eq!(s.time, 0);
        assert_eq!(s.turn, 0);
        assert!(!s.is_in_emergency_mode());
    }

    #[test]
    fn test_global_ratio_undefined_without_deposits() {
        let s = system();
        assert_eq!(s.global_collateral_ratio(), Err(CdpError::UndefinedRatio));
    }

    #[test]
    fn test_global_ratio_in_bps() {
        let mut s = system();
        s.update_deposits(1_000);
        s.update_debt(250);
        assert_eq!(s.global_collateral_ratio(), Ok(2_500));
    }

    #[test]
    fn test_global_solvency_boundary_is_strict() {
        let mut s = system();
        s.set_feed(2 * u128::from(PRICE_SCALE));
        s.update_deposits(100);

        s.update_debt(199);
        assert!(s.is_solvent());

        // debt == deposits * feed is insolvent
        s.update_debt(1);
        assert_eq!(s.global_max_borrow(), 200);
        assert!(!s.is_solvent());
    }

    #[test]
    fn test_zero_feed_accepted() {
        let mut s = system();
        s.advance_time(36);
        s.set_feed(0);
        assert_eq!(s.get_feed(), 0);
        assert_eq!(s.feed.updated_at(), 36);
        assert_eq!(s.global_max_borrow(), 0);
    }

    #[test]
    fn test_time_and_turn_are_monotone() {
        let mut s = system();
        s.advance_time(12);
        s.next_turn();
        s.advance_time(12);
        s.next_turn();
        assert_eq!(s.time, 24);
        assert_eq!(s.turn, 2);
    }

    #[test]
    fn test_negative_delta_saturates_at_zero() {
        let mut s = system();
        s.update_deposits(10);
        s.update_deposits(-20);
        assert_eq!(s.total_deposits, 0);
    }
}
