//! CDP Simulator
//!
//! Runs the drawdown check, then drives configured actors through the
//! turn scheduler with an optional mid-run price shock.

mod agents;
mod config;
mod drawdown;

use amm_model::SwapPool;
use anyhow::{Context, Result};
use cdp_engine::{PositionStatus, Simulation};
use config::Config;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Set to a path to write the default config there and exit
const WRITE_DEFAULT_ENV: &str = "CDP_SIM_WRITE_DEFAULT";

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Ok(path) = std::env::var(WRITE_DEFAULT_ENV) {
        return Config::write_default(Path::new(&path));
    }

    log::info!("Starting CDP simulation");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({:#}), using defaults", e);
        Config::default()
    });

    drawdown::run_drawdown(config.params, 0).context("drawdown check failed")?;

    let pool = SwapPool::from_config(&config.pool)
        .map_err(|e| anyhow::anyhow!("invalid pool config: {}", e))?;

    let mut sim = Simulation::new(config.params, ChaCha8Rng::seed_from_u64(config.seed));
    for actor in &config.actors {
        let id = sim.add_actor(
            actor.name.clone(),
            actor.speed,
            u128::from(actor.collateral),
            agents::build_agent(actor, pool),
        )?;
        log::info!("{} = {} ({:?}, speed {})", id, actor.name, actor.role, actor.speed);
    }

    let shock_turn = config.turns / 2;

    for turn in 0..config.turns {
        if turn == shock_turn {
            if let Some(feed) = config.shock_feed {
                sim.set_feed(u128::from(feed));
            }
        }

        let report = sim.take_turn();
        log::info!(
            "turn {}: {} intents, {} rejected, deposits={} debt={} solvent={}",
            report.turn,
            report.outcomes.len(),
            report.failures().count(),
            sim.system().total_deposits,
            sim.system().total_debt,
            sim.system().is_solvent()
        );

        anyhow::ensure!(sim.check_conservation(), "conservation violated after turn {}", report.turn);
    }

    let liquidated = sim
        .positions()
        .iter()
        .filter(|p| p.status() == PositionStatus::Liquidated)
        .count();

    log::info!(
        "Finished {} turns at t={}: {} positions ({} liquidated), ratio={:?}",
        sim.system().turn,
        sim.system().time,
        sim.positions().len(),
        liquidated,
        sim.system().global_collateral_ratio()
    );

    for actor in sim.actors() {
        log::info!(
            "{}: collateral={} debt_tokens={}",
            actor.name(),
            actor.get_balance(),
            actor.debt_balance()
        );
    }

    Ok(())
}
