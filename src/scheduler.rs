//! Turn-based scheduler
//!
//! Single-threaded and cooperative. Each turn draws one ordering of the
//! actors, then for every actor in that order calls [`Agent::take_action`]
//! against a read-only [`TurnView`] and applies the returned intents
//! serially before the next actor runs. All state mutation funnels through
//! [`Simulation::apply`], so the aggregate invariants hold after every intent.

use rand::Rng;

use crate::actor::{Actor, ActorId};
use crate::error::{CdpError, Result};
use crate::math::add_u128;
use crate::params::Params;
use crate::position::{Liquidation, Position, PositionId};
use crate::system::System;

/// Read-only snapshot handed to an agent when it is its turn to act
pub struct TurnView<'a> {
    pub turn: u64,
    pub actor: &'a Actor,
    pub system: &'a System,
    pub positions: &'a [Position],
}

impl<'a> TurnView<'a> {
    /// Active positions owned by the acting actor
    pub fn own_positions(&self) -> impl Iterator<Item = &'a Position> {
        let me = self.actor.id();
        let positions: &'a [Position] = self.positions;
        positions.iter().filter(move |p| p.owner() == me && p.is_active())
    }

    /// Positions owned by others that can be liquidated at the current feed
    pub fn liquidatable(&self) -> impl Iterator<Item = &'a Position> {
        let me = self.actor.id();
        let system: &'a System = self.system;
        let positions: &'a [Position] = self.positions;
        positions
            .iter()
            .filter(move |p| p.owner() != me && p.is_liquidatable(system))
    }
}

/// Decision logic plugged in per actor
///
/// Invoked exactly once per actor per turn. The returned intents are applied
/// in order on behalf of that actor.
pub trait Agent {
    fn take_action(&mut self, turn: u64, view: &TurnView<'_>) -> Vec<Intent>;
}

/// Agent that never acts
pub struct Idle;

impl Agent for Idle {
    fn take_action(&mut self, _turn: u64, _view: &TurnView<'_>) -> Vec<Intent> {
        Vec::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Open a new empty position owned by the acting actor
    Open,
    Deposit { position: PositionId, amount: u128 },
    Withdraw { position: PositionId, amount: u128 },
    Borrow { position: PositionId, amount: u128 },
    Repay { position: PositionId, amount: u128 },
    Liquidate { position: PositionId, amount: u128 },
}

/// What an applied intent did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Opened(PositionId),
    Applied,
    Liquidated(Liquidation),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentOutcome {
    pub actor: ActorId,
    pub intent: Intent,
    pub result: Result<Effect>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// Turn index this report covers
    pub turn: u64,
    /// Order in which actors were dispatched
    pub order: Vec<ActorId>,
    pub outcomes: Vec<IntentOutcome>,
}

impl TurnReport {
    pub fn failures(&self) -> impl Iterator<Item = &IntentOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Simulation arena: the system ledger plus every actor, agent and position
pub struct Simulation<R: Rng> {
    system: System,
    actors: Vec<Actor>,
    /// Parallel to `actors`
    agents: Vec<Box<dyn Agent>>,
    positions: Vec<Position>,
    rng: R,
}

impl<R: Rng> Simulation<R> {
    /// Create a simulation. Inject a seeded RNG for reproducible ordering.
    pub fn new(params: Params, rng: R) -> Self {
        Self {
            system: System::new(params),
            actors: Vec::new(),
            agents: Vec::new(),
            positions: Vec::new(),
            rng,
        }
    }

    pub fn add_actor(
        &mut self,
        name: impl Into<String>,
        speed: u32,
        collateral: u128,
        agent: Box<dyn Agent>,
    ) -> Result<ActorId> {
        let id = ActorId(self.actors.len());
        let actor = Actor::new(id, name, speed, collateral)?;
        self.actors.push(actor);
        self.agents.push(agent);
        Ok(id)
    }

    pub fn open_position(&mut self, owner: ActorId) -> Result<PositionId> {
        let actor = self.actors.get(owner.0).ok_or(CdpError::ActorNotFound)?;
        let id = PositionId(self.positions.len());
        self.positions.push(Position::new(id, actor, &self.system));
        log::debug!("{} opened {}", owner, id);
        Ok(id)
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(id.0)
    }

    /// Oracle write
    pub fn set_feed(&mut self, price: u128) {
        self.system.set_feed(price);
    }

    // ========================================
    // Operations on behalf of an actor
    // ========================================

    fn with_position<T>(
        &mut self,
        actor: ActorId,
        position: PositionId,
        op: impl FnOnce(&mut Position, &mut System, &mut Actor) -> Result<T>,
    ) -> Result<T> {
        let p = self.positions.get_mut(position.0).ok_or(CdpError::PositionNotFound)?;
        let a = self.actors.get_mut(actor.0).ok_or(CdpError::ActorNotFound)?;
        op(p, &mut self.system, a)
    }

    pub fn deposit(&mut self, actor: ActorId, position: PositionId, amount: u128) -> Result<()> {
        self.with_position(actor, position, |p, s, a| p.deposit(s, a, amount))
    }

    pub fn withdraw(&mut self, actor: ActorId, position: PositionId, amount: u128) -> Result<()> {
        self.with_position(actor, position, |p, s, a| p.withdraw(s, a, amount))
    }

    pub fn borrow(&mut self, actor: ActorId, position: PositionId, amount: u128) -> Result<()> {
        self.with_position(actor, position, |p, s, a| p.borrow(s, a, amount))
    }

    pub fn repay(&mut self, actor: ActorId, position: PositionId, amount: u128) -> Result<()> {
        self.with_position(actor, position, |p, s, a| p.repay(s, a, amount))
    }

    pub fn liquidate(
        &mut self,
        liquidator: ActorId,
        position: PositionId,
        amount: u128,
    ) -> Result<Liquidation> {
        let p = self.positions.get_mut(position.0).ok_or(CdpError::PositionNotFound)?;
        let owner = p.owner();
        if liquidator == owner {
            log::warn!("{} declined: owner cannot liquidate {}", liquidator, position);
            return Err(CdpError::SelfLiquidation);
        }
        let (owner, liquidator) =
            pair_mut(&mut self.actors, owner.0, liquidator.0).ok_or(CdpError::ActorNotFound)?;
        p.liquidate(&mut self.system, owner, liquidator, amount)
    }

    /// Apply one intent on behalf of `actor`
    pub fn apply(&mut self, actor: ActorId, intent: Intent) -> Result<Effect> {
        match intent {
            Intent::Open => self.open_position(actor).map(Effect::Opened),
            Intent::Deposit { position, amount } => {
                self.deposit(actor, position, amount).map(|_| Effect::Applied)
            }
            Intent::Withdraw { position, amount } => {
                self.withdraw(actor, position, amount).map(|_| Effect::Applied)
            }
            Intent::Borrow { position, amount } => {
                self.borrow(actor, position, amount).map(|_| Effect::Applied)
            }
            Intent::Repay { position, amount } => {
                self.repay(actor, position, amount).map(|_| Effect::Applied)
            }
            Intent::Liquidate { position, amount } => {
                self.liquidate(actor, position, amount).map(Effect::Liquidated)
            }
        }
    }

    // ========================================
    // Invariants
    // ========================================

    /// Exact aggregate checks:
    /// - total_deposits == Σ position.deposits
    /// - total_debt == Σ position.debt
    /// - total_debt == Σ actor.debt_balance (debt-token supply)
    pub fn check_conservation(&self) -> bool {
        let (deposits, debt) = self
            .positions
            .iter()
            .fold((0u128, 0u128), |(d, b), p| (add_u128(d, p.deposits()), add_u128(b, p.debt())));
        let supply = self
            .actors
            .iter()
            .fold(0u128, |acc, a| add_u128(acc, a.debt_balance()));

        self.system.total_deposits == deposits
            && self.system.total_debt == debt
            && self.system.total_debt == supply
    }

    // ========================================
    // Scheduling
    // ========================================

    /// Fresh ordering: key = speed * U with U ~ Uniform[0, 1), highest first
    pub fn turn_order(&mut self) -> Vec<ActorId> {
        let mut keyed: Vec<(f64, ActorId)> = self
            .actors
            .iter()
            .map(|a| (f64::from(a.speed()) * self.rng.gen::<f64>(), a.id()))
            .collect();
        // Stable: equal keys keep insertion order
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// Run one turn: order, dispatch, advance time, bump the turn counter
    pub fn take_turn(&mut self) -> TurnReport {
        let turn = self.system.turn;
        let order = self.turn_order();
        let mut outcomes = Vec::new();

        for &actor in &order {
            let intents = {
                let view = TurnView {
                    turn,
                    actor: &self.actors[actor.0],
                    system: &self.system,
                    positions: &self.positions,
                };
                self.agents[actor.0].take_action(turn, &view)
            };

            for intent in intents {
                let result = self.apply(actor, intent);
                if let Err(e) = &result {
                    log::warn!("turn {}: {} {:?} rejected: {}", turn, actor, intent, e);
                }
                outcomes.push(IntentOutcome { actor, intent, result });
            }
        }

        self.system.advance_time(self.system.params.seconds_per_turn);
        self.system.next_turn();

        log::debug!(
            "turn {} done: {} intents, t={}",
            turn,
            outcomes.len(),
            self.system.time
        );

        TurnReport { turn, order, outcomes }
    }
}

/// Two distinct mutable elements of a slice
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }
    if a < b {
        let (left, right) = items.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = items.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
