//! Actors and the position capability that gates their balances

use core::fmt;

use crate::error::{CdpError, Result};

/// Index of an actor inside a [`crate::Simulation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(pub usize);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Capability required to move an actor's balances
///
/// This is a capability check, not an identity check: anything that proves
/// it is a position may adjust the balances of the actor it is paired with.
pub trait PositionCapability {
    fn is_position(&self) -> bool;
}

/// A simulated user holding collateral and debt tokens outside any position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    id: ActorId,
    name: String,

    /// Turn-ordering weight, not solvency-relevant
    speed: u32,

    /// Collateral held outside any position
    collateral: u128,

    /// Debt tokens held (minted on borrow, burned on repay/liquidation)
    debt_balance: u128,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, speed: u32, collateral: u128) -> Result<Self> {
        if speed == 0 {
            return Err(CdpError::InvalidSpeed);
        }
        Ok(Self {
            id,
            name: name.into(),
            speed,
            collateral,
            debt_balance: 0,
        })
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Collateral held outside any position
    pub fn get_balance(&self) -> u128 {
        self.collateral
    }

    pub fn debt_balance(&self) -> u128 {
        self.debt_balance
    }

    fn authorize<C: PositionCapability + ?Sized>(&self, caller: &C, op: &str) -> Result<()> {
        if caller.is_position() {
            Ok(())
        } else {
            log::warn!("{}: {} rejected, caller is not a position", self.id, op);
            Err(CdpError::CapabilityViolation)
        }
    }

    pub fn reduce_balance<C: PositionCapability + ?Sized>(&mut self, caller: &C, amount: u128) -> Result<()> {
        self.authorize(caller, "reduce_balance")?;
        self.collateral = self
            .collateral
            .checked_sub(amount)
            .ok_or(CdpError::InsufficientBalance)?;
        Ok(())
    }

    pub fn increase_balance<C: PositionCapability + ?Sized>(&mut self, caller: &C, amount: u128) -> Result<()> {
        self.authorize(caller, "increase_balance")?;
        self.collateral = self.collateral.checked_add(amount).ok_or(CdpError::Overflow)?;
        Ok(())
    }

    pub fn mint_debt<C: PositionCapability + ?Sized>(&mut self, caller: &C, amount: u128) -> Result<()> {
        self.authorize(caller, "mint_debt")?;
        self.debt_balance = self.debt_balance.checked_add(amount).ok_or(CdpError::Overflow)?;
        Ok(())
    }

    pub fn burn_debt<C: PositionCapability + ?Sized>(&mut self, caller: &C, amount: u128) -> Result<()> {
        self.authorize(caller, "burn_debt")?;
        self.debt_balance = self
            .debt_balance
            .checked_sub(amount)
            .ok_or(CdpError::InsufficientBalance)?;
        Ok(())
    }
}
