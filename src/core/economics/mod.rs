#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Staking economics: reward accrual, pool ledger, stake ledger.

pub mod pool;
pub mod rewards;
pub mod stake;
