// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Positions opened.
    pub stakes_created_total: IntCounter,
    /// Withdrawals applied (partial and full).
    pub unstakes_total: IntCounter,
    /// Withdrawals that closed a position.
    pub positions_completed_total: IntCounter,
    /// Reward claims applied.
    pub claims_total: IntCounter,
    /// Rejected operations, by error code.
    pub rejected_total: IntCounterVec,
    /// Verifier rejections, timeouts and backend failures.
    pub verifier_failures_total: IntCounter,
    /// Optimistic commits retried after a concurrent write.
    pub commit_conflicts_total: IntCounter,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let stakes_created_total =
            IntCounter::new("stakeledger_stakes_created_total", "Positions opened")
                .map_err(|_| MetricsError::Prom)?;
        let unstakes_total =
            IntCounter::new("stakeledger_unstakes_total", "Withdrawals applied")
                .map_err(|_| MetricsError::Prom)?;
        let positions_completed_total = IntCounter::new(
            "stakeledger_positions_completed_total",
            "Withdrawals that closed a position",
        )
        .map_err(|_| MetricsError::Prom)?;
        let claims_total = IntCounter::new("stakeledger_claims_total", "Reward claims applied")
            .map_err(|_| MetricsError::Prom)?;
        let rejected_total = IntCounterVec::new(
            Opts::new("stakeledger_rejected_total", "Rejected operations"),
            &["op", "code"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let verifier_failures_total = IntCounter::new(
            "stakeledger_verifier_failures_total",
            "Verifier rejections, timeouts and failures",
        )
        .map_err(|_| MetricsError::Prom)?;
        let commit_conflicts_total = IntCounter::new(
            "stakeledger_commit_conflicts_total",
            "Optimistic commits retried",
        )
        .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(stakes_created_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(unstakes_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(positions_completed_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(claims_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(rejected_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(verifier_failures_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(commit_conflicts_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            stakes_created_total,
            unstakes_total,
            positions_completed_total,
            claims_total,
            rejected_total,
            verifier_failures_total,
            commit_conflicts_total,
        })
    }

    /// Count a rejected operation.
    pub fn rejected(&self, op: &str, code: &str) {
        self.rejected_total.with_label_values(&[op, code]).inc();
    }

    /// Prometheus text exposition.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Prom)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Prom)
    }
}
