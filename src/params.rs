//! Engine parameters

use serde::{Deserialize, Serialize};

/// Fixed-point scale of the feed (1e6)
pub const PRICE_SCALE: u64 = 1_000_000;

/// Basis points scale (10,000 bps = 100%)
pub const MAX_BPS: u64 = 10_000;

/// Named, overridable configuration constants
///
/// `max_ltv_bps`, `fee_per_second` and `origination_fee_bps` are carried and
/// readable but no operation charges them yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Basis points scale used by collateral ratios
    pub max_bps: u64,

    /// Maximum loan-to-value in basis points (15000 = 150%)
    pub max_ltv_bps: u64,

    /// Continuous borrow fee per second
    pub fee_per_second: u64,

    /// One-time fee on newly issued debt in basis points
    pub origination_fee_bps: u64,

    /// Simulated seconds per scheduler turn
    pub seconds_per_turn: u64,

    /// Initial collateral price (scaled by PRICE_SCALE)
    pub initial_feed: u64,

    /// Extra collateral paid to a liquidator on top of the repaid value
    pub liquidation_bonus_bps: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_bps: MAX_BPS,
            max_ltv_bps: 15_000,
            fee_per_second: 0,
            origination_fee_bps: 50,
            seconds_per_turn: 12,
            initial_feed: 1_000 * PRICE_SCALE,
            liquidation_bonus_bps: 500,
        }
    }
}

impl Params {
    /// Parse parameters from TOML; missing fields take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
