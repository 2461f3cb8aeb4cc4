// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Staking error taxonomy shared by the ledgers and the service.

use crate::core::state::persistent_state::StateError;
use crate::core::types::{Amount, CodecError, EntropyUnavailable, ParseError};
use thiserror::Error;
use tracing::error;

/// Caller-recoverable staking errors plus an opaque `Internal` class.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StakingError {
    /// Pool or position does not exist (or is not active for the caller).
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Pool exists but is not accepting stake.
    #[error("staking pool is not active")]
    PoolUnavailable,
    /// Deposit below the pool minimum.
    #[error("minimum stake amount is {min}")]
    BelowMinimum {
        /// Pool minimum.
        min: Amount,
    },
    /// Deposit would push the pool total above capacity.
    #[error("pool capacity exceeded (available {available})")]
    CapacityExceeded {
        /// Remaining room in the pool.
        available: Amount,
    },
    /// Position is still inside its lock period.
    #[error("tokens are still in lock period ({remaining_secs}s remaining)")]
    LockPeriodActive {
        /// Seconds until unlock.
        remaining_secs: u64,
    },
    /// Verification rejected, timed out, or the identifier is malformed.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(&'static str),
    /// Transaction identifier already recorded against a position.
    #[error("transaction already used")]
    DuplicateTransaction,
    /// Nothing to claim.
    #[error("no rewards available to claim")]
    NoRewardsAvailable,
    /// Request input outside its bounds.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Concurrent mutations kept superseding this operation.
    #[error("concurrent modification, retry with a fresh transaction")]
    Conflict,
    /// Storage failure or broken invariant.
    #[error("internal error")]
    Internal,
}

impl StakingError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            StakingError::NotFound(_) => "not_found",
            StakingError::PoolUnavailable => "pool_unavailable",
            StakingError::BelowMinimum { .. } => "below_minimum",
            StakingError::CapacityExceeded { .. } => "capacity_exceeded",
            StakingError::LockPeriodActive { .. } => "lock_period_active",
            StakingError::InvalidTransaction(_) => "invalid_transaction",
            StakingError::DuplicateTransaction => "duplicate_transaction",
            StakingError::NoRewardsAvailable => "no_rewards_available",
            StakingError::Validation(_) => "validation",
            StakingError::Conflict => "conflict",
            StakingError::Internal => "internal",
        }
    }
}

impl From<StateError> for StakingError {
    fn from(e: StateError) -> Self {
        error!(error = %e, "ledger store failure");
        StakingError::Internal
    }
}

impl From<EntropyUnavailable> for StakingError {
    fn from(e: EntropyUnavailable) -> Self {
        error!(error = %e, "cannot allocate record id");
        StakingError::Internal
    }
}

impl From<CodecError> for StakingError {
    fn from(_: CodecError) -> Self {
        StakingError::Internal
    }
}

impl From<ParseError> for StakingError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::TxId => StakingError::InvalidTransaction("malformed identifier"),
            other => StakingError::Validation(other.to_string()),
        }
    }
}
