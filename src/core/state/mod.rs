#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Ledger persistence.

pub mod persistent_state;
