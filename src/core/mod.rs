#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Staking core: value types, ledgers, persistence and orchestration.

pub mod config;
pub mod economics;
pub mod error;
pub mod service;
pub mod state;
pub mod types;
