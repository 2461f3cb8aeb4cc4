#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Observability: Prometheus metrics.

pub mod metrics;
