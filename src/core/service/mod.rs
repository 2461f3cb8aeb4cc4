#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Orchestration: clock, verifier seam, staking operations and reporting.

pub mod clock;
pub mod query;
pub mod staking;
pub mod verifier;
