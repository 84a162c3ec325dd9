//! Demonstration agents driven by the simulation binary

use amm_model::SwapPool;
use cdp_engine::{Agent, Intent, Position, TurnView, MAX_BPS};

use crate::config::{ActorConfig, Role};

pub fn build_agent(actor: &ActorConfig, pool: SwapPool) -> Box<dyn Agent> {
    match actor.role {
        Role::Borrower => Box::new(Borrower::new(actor.target_ltv_bps, pool)),
        Role::Liquidator => Box::new(Liquidator::new(actor.target_ltv_bps)),
        Role::Idle => Box::new(cdp_engine::Idle),
    }
}

/// Open a position and move the whole wallet into it
fn bootstrap(view: &TurnView<'_>) -> Option<Vec<Intent>> {
    let Some(position) = view.own_positions().next() else {
        return Some(vec![Intent::Open]);
    };
    let balance = view.actor.get_balance();
    if balance > 0 {
        return Some(vec![Intent::Deposit { position: position.id(), amount: balance }]);
    }
    None
}

fn bps_of(value: u128, bps: u64) -> u128 {
    value.saturating_mul(u128::from(bps)) / u128::from(MAX_BPS)
}

/// Borrows toward a target fraction of its collateral value and repays when
/// the value drops below it. Collateral is valued at the lower of the feed
/// and the pool's spot price.
pub struct Borrower {
    target_ltv_bps: u64,
    pool: SwapPool,
}

impl Borrower {
    pub fn new(target_ltv_bps: u64, pool: SwapPool) -> Self {
        Self { target_ltv_bps, pool }
    }

    fn collateral_value(&self, view: &TurnView<'_>, position: &Position) -> u128 {
        let by_feed = position.max_borrow(view.system);
        // f64 -> u128 casts saturate
        let by_pool = (position.deposits() as f64 * self.pool.spot_price()) as u128;
        by_feed.min(by_pool)
    }
}

impl Agent for Borrower {
    fn take_action(&mut self, _turn: u64, view: &TurnView<'_>) -> Vec<Intent> {
        if let Some(intents) = bootstrap(view) {
            return intents;
        }
        let Some(position) = view.own_positions().next() else {
            return Vec::new();
        };

        let target = bps_of(self.collateral_value(view, position), self.target_ltv_bps);
        let debt = position.debt();

        if debt < target {
            vec![Intent::Borrow { position: position.id(), amount: target - debt }]
        } else if debt > target {
            let amount = (debt - target).min(view.actor.debt_balance());
            if amount == 0 {
                return Vec::new();
            }
            vec![Intent::Repay { position: position.id(), amount }]
        } else {
            Vec::new()
        }
    }
}

/// Keeps a float of debt tokens and spends it on insolvent positions
pub struct Liquidator {
    float_ltv_bps: u64,
}

impl Liquidator {
    pub fn new(float_ltv_bps: u64) -> Self {
        Self { float_ltv_bps }
    }
}

impl Agent for Liquidator {
    fn take_action(&mut self, _turn: u64, view: &TurnView<'_>) -> Vec<Intent> {
        if let Some(intents) = bootstrap(view) {
            return intents;
        }
        let Some(own) = view.own_positions().next() else {
            return Vec::new();
        };

        if own.debt() == 0 {
            let amount = bps_of(own.max_borrow(view.system), self.float_ltv_bps);
            if amount > 0 {
                return vec![Intent::Borrow { position: own.id(), amount }];
            }
        }

        let mut budget = view.actor.debt_balance();
        let mut intents = Vec::new();
        for target in view.liquidatable() {
            if budget == 0 {
                break;
            }
            let amount = target.debt().min(budget);
            budget -= amount;
            intents.push(Intent::Liquidate { position: target.id(), amount });
        }
        intents
    }
}
