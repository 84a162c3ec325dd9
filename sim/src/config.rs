//! Simulation configuration

use amm_model::PoolConfig;
use anyhow::{Context, Result};
use cdp_engine::{Params, PRICE_SCALE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CDP_SIM_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Opens a position, deposits everything and borrows toward a target LTV
    Borrower,
    /// Borrows a float of debt tokens and spends it liquidating others
    Liquidator,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub name: String,

    /// Turn-ordering weight
    pub speed: u32,

    /// Starting collateral in base units
    pub collateral: u64,

    pub role: Role,

    /// Borrow target as a fraction of collateral value, in bps
    #[serde(default = "default_target_ltv_bps")]
    pub target_ltv_bps: u64,
}

fn default_target_ltv_bps() -> u64 {
    5_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for turn ordering
    pub seed: u64,

    /// Number of scheduler turns to run
    pub turns: u64,

    /// Feed written halfway through the run (scaled by PRICE_SCALE)
    pub shock_feed: Option<u64>,

    pub actors: Vec<ActorConfig>,

    pub pool: PoolConfig,

    pub params: Params,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 1,
            turns: 20,
            shock_feed: Some(300 * PRICE_SCALE),
            actors: vec![
                ActorConfig {
                    name: "alice".to_string(),
                    speed: 3,
                    collateral: 1_000_000_000_000_000_000,
                    role: Role::Borrower,
                    target_ltv_bps: 5_000,
                },
                ActorConfig {
                    name: "bob".to_string(),
                    speed: 2,
                    collateral: 500_000_000_000_000_000,
                    role: Role::Borrower,
                    target_ltv_bps: 9_000,
                },
                ActorConfig {
                    name: "carol".to_string(),
                    speed: 5,
                    collateral: 2_000_000_000_000_000_000,
                    role: Role::Liquidator,
                    target_ltv_bps: 2_000,
                },
            ],
            pool: PoolConfig::default(),
            params: Params::default(),
        }
    }
}

impl Config {
    /// Load configuration from the TOML file named by `CDP_SIM_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "cdp-sim.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Write default config to file
    pub fn write_default(path: &Path) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(&Self::default()).context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        log::info!("Created default config at {}", path.display());
        Ok(())
    }
}
