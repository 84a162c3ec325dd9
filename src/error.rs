//! Error taxonomy for ledger operations

use thiserror::Error;

/// Which solvency check rejected an operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// `debt < deposits * feed` for a single position
    Position,
    /// `total_debt < total_deposits * feed` for the whole system
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CdpError {
    /// Operation would leave the position or the system insolvent
    #[error("operation would leave the {scope:?} insolvent")]
    Insolvent { scope: Scope },

    /// Balance adjustment requested by a caller without the position capability
    #[error("caller lacks the position capability")]
    CapabilityViolation,

    /// Collateral ratio requested with zero deposits
    #[error("collateral ratio is undefined for zero deposits")]
    UndefinedRatio,

    /// Owner tried to liquidate their own position
    #[error("owner cannot liquidate their own position")]
    SelfLiquidation,

    /// Position is solvent or carries no debt
    #[error("position is not eligible for liquidation")]
    NotLiquidatable,

    /// Amount must be strictly positive
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Withdrawal exceeds position deposits
    #[error("withdrawal exceeds position deposits")]
    InsufficientDeposits,

    /// Repayment exceeds outstanding debt
    #[error("repayment exceeds outstanding debt")]
    ExcessRepayment,

    /// Actor does not hold enough collateral or debt tokens
    #[error("insufficient actor balance")]
    InsufficientBalance,

    /// Actor is not the owner of the position
    #[error("actor does not own this position")]
    NotOwner,

    /// Position reached its terminal liquidated state
    #[error("position has been liquidated")]
    PositionClosed,

    /// Actor speed must be positive
    #[error("actor speed must be positive")]
    InvalidSpeed,

    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,

    #[error("actor not found")]
    ActorNotFound,

    #[error("position not found")]
    PositionNotFound,
}

pub type Result<T> = core::result::Result<T, CdpError>;
