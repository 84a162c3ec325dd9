//! Single-position drawdown check run before the turn loop
//!
//! One actor deposits its whole wallet into one position, then the feed is
//! zeroed to confirm the system detects insolvency.

use anyhow::{ensure, Result};
use cdp_engine::{Idle, Params, Simulation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// 1 whole collateral token in base units
pub const ONE: u128 = 1_000_000_000_000_000_000;

pub fn run_drawdown(params: Params, drawdown_value: u128) -> Result<()> {
    let mut sim = Simulation::new(params, ChaCha8Rng::seed_from_u64(0));
    let user = sim.add_actor("A", 1, ONE, Box::new(Idle))?;
    let trove = sim.open_position(user)?;

    let max_borrow = |sim: &Simulation<ChaCha8Rng>| {
        sim.position(trove).map(|p| p.max_borrow(sim.system())).unwrap_or(0)
    };

    ensure!(max_borrow(&sim) == 0, "empty position must have no borrowing power");

    sim.deposit(user, trove, ONE)?;
    let capacity = max_borrow(&sim);
    ensure!(capacity > 0, "deposit must create borrowing power");
    ensure!(sim.system().is_solvent(), "fresh system must be solvent");
    log::info!("drawdown: deposited {} -> max borrow {}", ONE, capacity);

    // Insolvency must be detected once the feed drops to the drawdown value
    sim.set_feed(drawdown_value);
    ensure!(!sim.system().is_solvent(), "system solvent at feed {}", drawdown_value);
    ensure!(sim.check_conservation(), "conservation violated");

    log::info!("drawdown: insolvency detected at feed {}", drawdown_value);
    Ok(())
}
