//! Collateralized debt position engine
//!
//! ⚠️ SIMULATION ONLY - NOT A PRODUCTION FINANCIAL SYSTEM ⚠️
//!
//! Users deposit collateral into per-user positions ("troves"), borrow a
//! synthetic debt token against it, and the system tracks local and global
//! solvency as an oracle feed moves. The engine guarantees:
//! 1. Conservation - `total_deposits` and `total_debt` always equal the sums
//!    over live positions, and the debt-token supply equals `total_debt`
//! 2. Atomicity - a rejected operation leaves no partial mutation behind
//! 3. Solvency - every successful borrow or withdraw leaves the position and
//!    the system strictly solvent at the current feed
//! 4. Deterministic replay - turn ordering draws from an injected RNG
//!
//! The [`Simulation`] arena owns every actor, agent and position. Ledger
//! operations live on [`Position`] and take the shared [`System`] context by
//! reference, so there is no hidden process-wide state.

#![forbid(unsafe_code)]

pub mod actor;
pub mod error;
pub mod math;
pub mod params;
pub mod position;
pub mod scheduler;
pub mod system;

pub use actor::*;
pub use error::*;
pub use params::*;
pub use position::*;
pub use scheduler::*;
pub use system::*;
