//! Fast unit tests for the CDP engine
//! Run with: cargo test

use cdp_engine::*;
use rand::rngs::mock::StepRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Feed of exactly one debt unit per collateral unit
const PAR: u128 = PRICE_SCALE as u128;

fn sim() -> Simulation<StepRng> {
    let mut sim = Simulation::new(Params::default(), StepRng::new(0, 1));
    sim.set_feed(PAR);
    sim
}

/// Actor with one funded, empty position
fn funded(sim: &mut Simulation<StepRng>, name: &str, collateral: u128) -> (ActorId, PositionId) {
    let actor = sim.add_actor(name, 1, collateral, Box::new(Idle)).unwrap();
    let position = sim.open_position(actor).unwrap();
    (actor, position)
}

/// Everything observable about a simulation, for "no mutation on error" checks
#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    system: System,
    actors: Vec<Actor>,
    positions: Vec<Position>,
}

impl Snapshot {
    fn take<R: rand::Rng>(sim: &Simulation<R>) -> Self {
        Snapshot {
            system: sim.system().clone(),
            actors: sim.actors().to_vec(),
            positions: sim.positions().to_vec(),
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

#[test]
fn test_conservation_over_mixed_operations() {
    let mut sim = sim();
    let (a, p0) = funded(&mut sim, "A", 1_000);
    let p1 = sim.open_position(a).unwrap();
    let (b, p2) = funded(&mut sim, "B", 1_000);

    sim.deposit(a, p0, 400).unwrap();
    sim.deposit(a, p1, 300).unwrap();
    sim.deposit(b, p2, 900).unwrap();
    assert!(sim.check_conservation());

    sim.borrow(a, p0, 200).unwrap();
    sim.borrow(a, p1, 100).unwrap();
    sim.borrow(b, p2, 800).unwrap();
    assert!(sim.check_conservation());

    sim.repay(a, p0, 50).unwrap();
    sim.withdraw(a, p1, 150).unwrap();
    sim.withdraw(b, p2, 50).unwrap();
    assert!(sim.check_conservation());

    assert_eq!(sim.system().total_deposits, 400 + 150 + 850);
    assert_eq!(sim.system().total_debt, 150 + 100 + 800);
    assert_eq!(sim.actor(a).unwrap().debt_balance(), 250);
    assert_eq!(sim.actor(a).unwrap().get_balance(), 1_000 - 700 + 150);
}

#[test]
fn test_ratios_undefined_without_deposits() {
    let mut sim = sim();
    let (_, p) = funded(&mut sim, "A", 10);

    assert_eq!(sim.system().global_collateral_ratio(), Err(CdpError::UndefinedRatio));
    assert_eq!(
        sim.position(p).unwrap().local_collateral_ratio(sim.system()),
        Err(CdpError::UndefinedRatio)
    );
}

#[test]
fn test_empty_position_has_no_borrowing_power() {
    let mut sim = sim();
    let (a, p) = funded(&mut sim, "A", 10);

    assert_eq!(sim.position(p).unwrap().max_borrow(sim.system()), 0);
    assert_eq!(
        sim.borrow(a, p, 1),
        Err(CdpError::Insolvent { scope: Scope::Position })
    );
}

// ============================================================================
// Solvency
// ============================================================================

#[test]
fn test_solvency_is_monotone_in_feed() {
    let mut sim = sim();
    let (a, p) = funded(&mut sim, "A", 1_000);
    sim.deposit(a, p, 1_000).unwrap();
    sim.borrow(a, p, 600).unwrap();

    let mut seen_insolvent = false;
    for feed in (0..=10).rev().map(|i| PAR * i / 10) {
        sim.set_feed(feed);
        let solvent = sim.position(p).unwrap().is_solvent(sim.system());
        if seen_insolvent {
            assert!(!solvent, "lower feed {} restored solvency", feed);
        }
        seen_insolvent |= !solvent;
    }
    assert!(seen_insolvent);
}

#[test]
fn test_debt_equal_to_max_borrow_is_insolvent() {
    let mut sim = sim();
    let (a, p) = funded(&mut sim, "A", 100);
    sim.deposit(a, p, 100).unwrap();

    assert_eq!(
        sim.borrow(a, p, 100),
        Err(CdpError::Insolvent { scope: Scope::Position })
    );
    sim.borrow(a, p, 99).unwrap();

    // A tiny feed drop moves the position onto the boundary
    sim.set_feed(PAR * 99 / 100);
    let position = sim.position(p).unwrap();
    assert_eq!(position.max_borrow(sim.system()), 99);
    assert!(!position.is_solvent(sim.system()));
    assert!(!sim.system().is_solvent());
}

#[test]
fn test_borrow_rejected_by_system_check_is_atomic() {
    let mut sim = sim();
    let (a, pa) = funded(&mut sim, "A", 100);
    let (b, pb) = funded(&mut sim, "B", 100);
    sim.deposit(a, pa, 100).unwrap();
    sim.deposit(b, pb, 100).unwrap();
    sim.borrow(b, pb, 99).unwrap();

    // B is underwater, the system is still barely solvent
    sim.set_feed(PAR / 2);
    assert!(!sim.position(pb).unwrap().is_solvent(sim.system()));
    assert!(sim.system().is_solvent());

    // A is locally fine but would tip the system over
    let before = Snapshot::take(&sim);
    assert_eq!(
        sim.borrow(a, pa, 2),
        Err(CdpError::Insolvent { scope: Scope::System })
    );
    assert_eq!(Snapshot::take(&sim), before);
    assert_eq!(sim.position(pa).unwrap().debt(), 0);
    assert_eq!(sim.actor(a).unwrap().debt_balance(), 0);
}

#[test]
fn test_withdraw_that_breaks_solvency_is_rolled_back() {
    let mut sim = sim();
    let (a, p) = funded(&mut sim, "A", 100);
    sim.deposit(a, p, 100).unwrap();
    sim.borrow(a, p, 50).unwrap();

    let before = Snapshot::take(&sim);
    assert_eq!(
        sim.withdraw(a, p, 50),
        Err(CdpError::Insolvent { scope: Scope::Position })
    );
    assert_eq!(Snapshot::take(&sim), before);

    sim.withdraw(a, p, 49).unwrap();
    assert_eq!(sim.position(p).unwrap().deposits(), 51);
    assert_eq!(sim.actor(a).unwrap().get_balance(), 49);
}

#[test]
fn test_withdraw_more_than_deposited() {
    let mut sim = sim();
    let (a, p) = funded(&mut sim, "A", 100);
    sim.deposit(a, p, 10).unwrap();
    assert_eq!(sim.withdraw(a, p, 11), Err(CdpError::InsufficientDeposits));
}

#[test]
fn test_non_owner_cannot_operate() {
    let mut sim = sim();
    let (a, p) = funded(&mut sim, "A", 100);
    let (b, _) = funded(&mut sim, "B", 100);
    sim.deposit(a, p, 100).unwrap();

    assert_eq!(sim.deposit(b, p, 1), Err(CdpError::NotOwner));
    assert_eq!(sim.withdraw(b, p, 1), Err(CdpError::NotOwner));
    assert_eq!(sim.borrow(b, p, 1), Err(CdpError::NotOwner));
}

// ============================================================================
// Capability gating
// ============================================================================

struct Impostor;

impl PositionCapability for Impostor {
    fn is_position(&self) -> bool {
        false
    }
}

#[test]
fn test_non_position_cannot_move_actor_balances() {
    let mut actor = Actor::new(ActorId(0), "A", 1, 500).unwrap();

    assert_eq!(actor.reduce_balance(&Impostor, 1), Err(CdpError::CapabilityViolation));
    assert_eq!(actor.increase_balance(&Impostor, 1), Err(CdpError::CapabilityViolation));
    assert_eq!(actor.mint_debt(&Impostor, 1), Err(CdpError::CapabilityViolation));
    assert_eq!(actor.burn_debt(&Impostor, 1), Err(CdpError::CapabilityViolation));
    assert_eq!(actor.get_balance(), 500);
    assert_eq!(actor.debt_balance(), 0);
}

// ============================================================================
// Liquidation
// ============================================================================

/// A: 200 deposited, 150 borrowed. C: liquidator holding 500 debt tokens.
/// Feed then drops to 0.75 so A sits exactly on the boundary.
fn underwater() -> (Simulation<StepRng>, ActorId, PositionId, ActorId, PositionId) {
    let mut sim = sim();
    let (a, pa) = funded(&mut sim, "A", 200);
    let (c, pc) = funded(&mut sim, "C", 1_000);
    sim.deposit(a, pa, 200).unwrap();
    sim.borrow(a, pa, 150).unwrap();
    sim.deposit(c, pc, 1_000).unwrap();
    sim.borrow(c, pc, 500).unwrap();

    sim.set_feed(PAR * 3 / 4);
    assert!(sim.position(pa).unwrap().is_liquidatable(sim.system()));
    assert!(!sim.position(pc).unwrap().is_liquidatable(sim.system()));
    (sim, a, pa, c, pc)
}

#[test]
fn test_owner_cannot_liquidate_own_position() {
    let (mut sim, a, pa, _, _) = underwater();
    let before = Snapshot::take(&sim);

    assert_eq!(sim.liquidate(a, pa, 10), Err(CdpError::SelfLiquidation));
    assert_eq!(sim.apply(a, Intent::Liquidate { position: pa, amount: 10 }), Err(CdpError::SelfLiquidation));
    assert_eq!(Snapshot::take(&sim), before);
}

#[test]
fn test_solvent_position_not_liquidatable() {
    let (mut sim, a, _, c, pc) = underwater();
    let before = Snapshot::take(&sim);

    assert_eq!(sim.liquidate(a, pc, 10), Err(CdpError::NotLiquidatable));
    assert_eq!(Snapshot::take(&sim), before);

    // Debt-free positions never qualify, even at a zero feed
    let (d, pd) = funded(&mut sim, "D", 10);
    sim.deposit(d, pd, 10).unwrap();
    sim.set_feed(0);
    assert_eq!(sim.liquidate(c, pd, 1), Err(CdpError::NotLiquidatable));
}

#[test]
fn test_liquidation_amount_guards() {
    let (mut sim, _, pa, c, _) = underwater();
    let (d, _) = funded(&mut sim, "D", 0);

    assert_eq!(sim.liquidate(c, pa, 0), Err(CdpError::ZeroAmount));
    assert_eq!(sim.liquidate(c, pa, 151), Err(CdpError::ExcessRepayment));
    // D holds no debt tokens
    assert_eq!(sim.liquidate(d, pa, 10), Err(CdpError::InsufficientBalance));
}

#[test]
fn test_partial_liquidation() {
    let (mut sim, _, pa, c, _) = underwater();

    let outcome = sim.liquidate(c, pa, 30).unwrap();
    // 30 debt = 40 collateral at 0.75, plus 5% bonus
    assert_eq!(
        outcome,
        Liquidation {
            repaid: 30,
            seized: 42,
            returned: 0,
            closed: false
        }
    );

    let position = sim.position(pa).unwrap();
    assert_eq!(position.debt(), 120);
    assert_eq!(position.deposits(), 158);
    assert_eq!(position.status(), PositionStatus::Active);

    let liquidator = sim.actor(c).unwrap();
    assert_eq!(liquidator.get_balance(), 42);
    assert_eq!(liquidator.debt_balance(), 470);
    assert!(sim.check_conservation());
}

#[test]
fn test_full_liquidation_closes_position() {
    let (mut sim, a, pa, c, pc) = underwater();

    let outcome = sim.liquidate(c, pa, 150).unwrap();
    assert!(outcome.closed);
    assert_eq!(outcome.seized, 200); // capped at deposits

    let position = sim.position(pa).unwrap();
    assert_eq!(position.status(), PositionStatus::Liquidated);
    assert_eq!(position.debt(), 0);
    assert_eq!(position.deposits(), 0);
    assert_eq!(sim.system().total_debt, 500);
    assert_eq!(sim.system().total_deposits, 1_000);
    assert!(sim.check_conservation());

    // Owner keeps the borrowed tokens, the position is terminal
    assert_eq!(sim.actor(a).unwrap().debt_balance(), 150);
    assert_eq!(sim.deposit(a, pa, 1), Err(CdpError::PositionClosed));
    assert_eq!(sim.repay(a, pa, 1), Err(CdpError::PositionClosed));
    assert_eq!(sim.liquidate(c, pa, 1), Err(CdpError::PositionClosed));

    // The liquidator spent 150 of its own tokens and cannot repay in full
    assert_eq!(sim.repay(c, pc, 500), Err(CdpError::InsufficientBalance));
    sim.repay(c, pc, 350).unwrap();
    assert!(sim.check_conservation());
}

#[test]
fn test_partial_liquidation_at_zero_feed_takes_all_collateral() {
    let (mut sim, a, pa, c, _) = underwater();
    sim.set_feed(0);

    let outcome = sim.liquidate(c, pa, 30).unwrap();
    assert_eq!(
        outcome,
        Liquidation {
            repaid: 30,
            seized: 200,
            returned: 0,
            closed: false
        }
    );

    // Stripped of collateral but still open with residual debt
    let position = sim.position(pa).unwrap();
    assert_eq!(position.status(), PositionStatus::Active);
    assert_eq!(position.deposits(), 0);
    assert_eq!(position.debt(), 120);
    assert!(position.is_liquidatable(sim.system()));
    assert_eq!(sim.actor(c).unwrap().get_balance(), 200);
    assert_eq!(sim.actor(a).unwrap().get_balance(), 0);
    assert!(sim.check_conservation());

    // The residual debt can still be cleared, for nothing
    let outcome = sim.liquidate(c, pa, 120).unwrap();
    assert_eq!(outcome.seized, 0);
    assert!(outcome.closed);
    assert_eq!(sim.position(pa).unwrap().status(), PositionStatus::Liquidated);
    assert_eq!(sim.actor(c).unwrap().debt_balance(), 350);
    assert!(sim.check_conservation());
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_turns_advance_clock() {
    let mut sim = sim();
    funded(&mut sim, "A", 1);
    funded(&mut sim, "B", 1);

    for _ in 0..5 {
        let report = sim.take_turn();
        assert_eq!(report.order.len(), 2);
        assert!(report.outcomes.is_empty());
    }
    assert_eq!(sim.system().turn, 5);
    assert_eq!(sim.system().time, 5 * 12);
}

#[test]
fn test_same_seed_same_order() {
    fn orders(seed: u64) -> Vec<Vec<ActorId>> {
        let mut sim = Simulation::new(Params::default(), ChaCha8Rng::seed_from_u64(seed));
        for (i, speed) in [3, 1, 7, 2].into_iter().enumerate() {
            sim.add_actor(format!("actor{}", i), speed, 0, Box::new(Idle)).unwrap();
        }
        (0..10).map(|_| sim.take_turn().order).collect()
    }

    assert_eq!(orders(42), orders(42));
    for order in orders(42) {
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec![ActorId(0), ActorId(1), ActorId(2), ActorId(3)]);
    }
}

#[test]
fn test_speed_biases_order() {
    let mut sim = Simulation::new(Params::default(), ChaCha8Rng::seed_from_u64(7));
    sim.add_actor("slow", 1, 0, Box::new(Idle)).unwrap();
    let fast = sim.add_actor("fast", 1_000, 0, Box::new(Idle)).unwrap();

    let fast_first = (0..100).filter(|_| sim.take_turn().order[0] == fast).count();
    assert!(fast_first >= 90, "fast actor first only {} times", fast_first);
}

/// Opens, funds and borrows in one call
struct OneShot {
    amount: u128,
}

impl Agent for OneShot {
    fn take_action(&mut self, turn: u64, view: &TurnView<'_>) -> Vec<Intent> {
        if turn > 0 {
            return Vec::new();
        }
        // The position this actor is about to open
        let position = PositionId(view.positions.len());
        vec![
            Intent::Open,
            Intent::Deposit { position, amount: self.amount },
            Intent::Borrow { position, amount: self.amount / 2 },
            Intent::Borrow { position, amount: self.amount },
        ]
    }
}

#[test]
fn test_intents_apply_serially() {
    let mut sim = sim();
    let a = sim.add_actor("A", 1, 100, Box::new(OneShot { amount: 100 })).unwrap();

    let report = sim.take_turn();
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.outcomes[0].result, Ok(Effect::Opened(PositionId(0))));
    assert_eq!(report.outcomes[1].result, Ok(Effect::Applied));
    assert_eq!(report.outcomes[2].result, Ok(Effect::Applied));
    // Later intents see earlier effects
    assert_eq!(
        report.outcomes[3].result,
        Err(CdpError::Insolvent { scope: Scope::Position })
    );
    assert_eq!(report.failures().count(), 1);
    assert!(report.outcomes.iter().all(|o| o.actor == a));

    assert_eq!(sim.position(PositionId(0)).unwrap().debt(), 50);
    assert!(sim.check_conservation());

    // Agent goes quiet afterwards
    assert!(sim.take_turn().outcomes.is_empty());
}
