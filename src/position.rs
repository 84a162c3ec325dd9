//! Positions (troves): per-actor deposit/debt ledgers
//!
//! Every mutating operation follows the same shape: validate, compute the
//! prospective state, run the solvency checks against it, and only then
//! commit to the position, the owner and the [`System`] aggregates. A
//! rejected operation therefore leaves nothing behind.

use core::fmt;

use crate::actor::{Actor, ActorId, PositionCapability};
use crate::error::{CdpError, Result, Scope};
use crate::math::*;
use crate::params::PRICE_SCALE;
use crate::system::{max_borrow_for, solvent_at, System};

/// Index of a position inside a [`crate::Simulation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionId(pub usize);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionStatus {
    Active,
    /// Terminal: debt was fully cleared by a liquidator
    Liquidated,
}

/// Outcome of a successful liquidation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Liquidation {
    /// Debt cancelled, paid with the liquidator's debt tokens
    pub repaid: u128,
    /// Collateral transferred to the liquidator (bonus included)
    pub seized: u128,
    /// Leftover collateral returned to the owner on close
    pub returned: u128,
    /// Position entered the `Liquidated` state
    pub closed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    id: PositionId,

    /// Back-reference to the owning actor; never reassigned
    owner: ActorId,

    pub(crate) deposits: u128,
    pub(crate) debt: u128,

    /// Simulated time of the last mutation (feeds no accrual yet)
    last_update_time: u64,

    status: PositionStatus,
}

impl PositionCapability for Position {
    fn is_position(&self) -> bool {
        true
    }
}

impl Position {
    /// Open an empty position bound to `owner`
    pub fn new(id: PositionId, owner: &Actor, system: &System) -> Self {
        Self {
            id,
            owner: owner.id(),
            deposits: 0,
            debt: 0,
            last_update_time: system.time,
            status: PositionStatus::Active,
        }
    }

    pub fn id(&self) -> PositionId {
        self.id
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn deposits(&self) -> u128 {
        self.deposits
    }

    pub fn debt(&self) -> u128 {
        self.debt
    }

    pub fn last_update_time(&self) -> u64 {
        self.last_update_time
    }

    pub fn status(&self) -> PositionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    // ========================================
    // Queries (read the feed at call time)
    // ========================================

    /// deposits * feed, in debt base units
    pub fn max_borrow(&self, system: &System) -> u128 {
        max_borrow_for(self.deposits, system.get_feed())
    }

    /// Local collateral ratio in basis points: debt * max_bps / deposits
    pub fn local_collateral_ratio(&self, system: &System) -> Result<u128> {
        let scaled = mul_u128(self.debt, u128::from(system.params.max_bps));
        div_u128(scaled, self.deposits).ok_or(CdpError::UndefinedRatio)
    }

    /// Strictly `debt < max_borrow()`; `debt == deposits * feed` is insolvent
    pub fn is_solvent(&self, system: &System) -> bool {
        solvent_at(self.debt, self.deposits, system.get_feed())
    }

    pub fn is_liquidatable(&self, system: &System) -> bool {
        self.is_active() && self.debt > 0 && !self.is_solvent(system)
    }

    // ========================================
    // Guards
    // ========================================

    fn ensure_active(&self) -> Result<()> {
        match self.status {
            PositionStatus::Active => Ok(()),
            PositionStatus::Liquidated => Err(CdpError::PositionClosed),
        }
    }

    fn ensure_owner(&self, actor: &Actor) -> Result<()> {
        if actor.id() == self.owner {
            Ok(())
        } else {
            Err(CdpError::NotOwner)
        }
    }

    fn touch(&mut self, system: &System) {
        self.last_update_time = system.time;
    }

    // ========================================
    // Operations
    // ========================================

    /// Move `amount` collateral from the owner into the position
    pub fn deposit(&mut self, system: &mut System, owner: &mut Actor, amount: u128) -> Result<()> {
        self.ensure_active()?;
        self.ensure_owner(owner)?;
        if amount == 0 {
            return Err(CdpError::ZeroAmount);
        }

        let delta = to_delta(amount).ok_or(CdpError::Overflow)?;
        let new_deposits = self.deposits.checked_add(amount).ok_or(CdpError::Overflow)?;
        system.total_deposits.checked_add(amount).ok_or(CdpError::Overflow)?;

        // Last fallible step: debit the owner
        owner.reduce_balance(&*self, amount)?;

        self.deposits = new_deposits;
        system.update_deposits(delta);
        self.touch(system);

        log::debug!("{} deposit {} (deposits={})", self.id, amount, self.deposits);
        Ok(())
    }

    /// Return `amount` collateral to the owner
    ///
    /// The post-withdraw position must stay solvent unless it carries no debt.
    /// Debt-free positions skip the check, so they can always withdraw in
    /// full, even at a zero feed.
    pub fn withdraw(&mut self, system: &mut System, owner: &mut Actor, amount: u128) -> Result<()> {
        self.ensure_active()?;
        self.ensure_owner(owner)?;
        if amount == 0 {
            return Err(CdpError::ZeroAmount);
        }
        if amount > self.deposits {
            return Err(CdpError::InsufficientDeposits);
        }

        let delta = to_delta(amount).ok_or(CdpError::Overflow)?;
        let new_deposits = self.deposits - amount;

        if self.debt > 0 && !solvent_at(self.debt, new_deposits, system.get_feed()) {
            return Err(CdpError::Insolvent { scope: Scope::Position });
        }

        owner.increase_balance(&*self, amount)?;

        self.deposits = new_deposits;
        system.update_deposits(-delta);
        self.touch(system);

        log::debug!("{} withdraw {} (deposits={})", self.id, amount, self.deposits);
        Ok(())
    }

    /// Issue `amount` debt tokens to the owner
    ///
    /// Both the position and the system must remain solvent afterwards.
    pub fn borrow(&mut self, system: &mut System, owner: &mut Actor, amount: u128) -> Result<()> {
        self.ensure_active()?;
        self.ensure_owner(owner)?;
        if amount == 0 {
            return Err(CdpError::ZeroAmount);
        }

        let delta = to_delta(amount).ok_or(CdpError::Overflow)?;
        let new_debt = self.debt.checked_add(amount).ok_or(CdpError::Overflow)?;
        let new_total_debt = system.total_debt.checked_add(amount).ok_or(CdpError::Overflow)?;

        if !solvent_at(new_debt, self.deposits, system.get_feed()) {
            return Err(CdpError::Insolvent { scope: Scope::Position });
        }
        if !system.would_be_solvent(new_total_debt, system.total_deposits) {
            return Err(CdpError::Insolvent { scope: Scope::System });
        }

        owner.mint_debt(&*self, amount)?;

        self.debt = new_debt;
        system.update_debt(delta);
        self.touch(system);

        log::debug!("{} borrow {} (debt={})", self.id, amount, self.debt);
        Ok(())
    }

    /// Burn `amount` of the owner's debt tokens against the position's debt
    pub fn repay(&mut self, system: &mut System, owner: &mut Actor, amount: u128) -> Result<()> {
        self.ensure_active()?;
        self.ensure_owner(owner)?;
        if amount == 0 {
            return Err(CdpError::ZeroAmount);
        }
        if amount > self.debt {
            return Err(CdpError::ExcessRepayment);
        }

        let delta = to_delta(amount).ok_or(CdpError::Overflow)?;

        owner.burn_debt(&*self, amount)?;

        self.debt -= amount;
        system.update_debt(-delta);
        self.touch(system);

        log::debug!("{} repay {} (debt={})", self.id, amount, self.debt);
        Ok(())
    }

    /// Liquidate an insolvent position
    ///
    /// The liquidator burns `amount` of its own debt tokens to cancel the same
    /// amount of debt and receives collateral worth `amount` at the current
    /// feed plus the liquidation bonus, capped at the position's deposits.
    /// With a zero feed the whole deposit is seized. Once the debt reaches
    /// zero the position closes and leftover collateral goes back to the owner.
    pub fn liquidate(
        &mut self,
        system: &mut System,
        owner: &mut Actor,
        liquidator: &mut Actor,
        amount: u128,
    ) -> Result<Liquidation> {
        self.ensure_active()?;
        self.ensure_owner(owner)?;
        if liquidator.id() == self.owner {
            return Err(CdpError::SelfLiquidation);
        }
        if amount == 0 {
            return Err(CdpError::ZeroAmount);
        }
        if !self.is_liquidatable(system) {
            return Err(CdpError::NotLiquidatable);
        }
        if amount > self.debt {
            return Err(CdpError::ExcessRepayment);
        }
        if liquidator.debt_balance() < amount {
            return Err(CdpError::InsufficientBalance);
        }

        let seized = self.seizable_collateral(system, amount);
        let new_debt = self.debt - amount;
        let closed = new_debt == 0;
        let returned = if closed { self.deposits - seized } else { 0 };
        let released = seized + returned;

        let debt_delta = to_delta(amount).ok_or(CdpError::Overflow)?;
        let deposit_delta = to_delta(released).ok_or(CdpError::Overflow)?;
        liquidator.get_balance().checked_add(seized).ok_or(CdpError::Overflow)?;
        owner.get_balance().checked_add(returned).ok_or(CdpError::Overflow)?;

        // Balances pre-checked above; these cannot fail past this point
        liquidator.burn_debt(&*self, amount)?;
        liquidator.increase_balance(&*self, seized)?;
        if returned > 0 {
            owner.increase_balance(&*self, returned)?;
        }

        self.debt = new_debt;
        self.deposits -= released;
        system.update_debt(-debt_delta);
        system.update_deposits(-deposit_delta);
        if closed {
            self.status = PositionStatus::Liquidated;
        }
        self.touch(system);

        log::info!(
            "{} liquidated by {}: repaid={} seized={} returned={} closed={}",
            self.id,
            liquidator.id(),
            amount,
            seized,
            returned,
            closed
        );

        Ok(Liquidation {
            repaid: amount,
            seized,
            returned,
            closed,
        })
    }

    /// Collateral owed to a liquidator repaying `amount` of debt
    fn seizable_collateral(&self, system: &System, amount: u128) -> u128 {
        let feed = system.get_feed();
        if feed == 0 {
            return self.deposits;
        }
        let max_bps = u128::from(system.params.max_bps);
        let value = mul_u128(amount, u128::from(PRICE_SCALE)) / feed;
        let with_bonus = mul_u128(value, add_u128(max_bps, u128::from(system.params.liquidation_bonus_bps)))
            .checked_div(max_bps)
            .unwrap_or(value);
        with_bonus.min(self.deposits)
    }
}
