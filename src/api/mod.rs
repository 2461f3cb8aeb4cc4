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

//! HTTP surface over the staking service.

pub mod auth;
pub mod handlers;
pub mod response;

use crate::api::auth::AdminToken;
use crate::core::service::query::Reporting;
use crate::core::service::staking::StakingService;
use crate::monitoring::metrics::Metrics;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Mutating operations.
    pub service: Arc<StakingService>,
    /// Read-only reports.
    pub reporting: Reporting,
    /// Metrics registry.
    pub metrics: Arc<Metrics>,
    /// Admin token; admin routes reject everything when `None`.
    pub admin: Option<Arc<AdminToken>>,
}

impl AppState {
    /// Build state around a service.
    pub fn new(
        service: Arc<StakingService>,
        metrics: Arc<Metrics>,
        admin: Option<AdminToken>,
    ) -> Self {
        Self {
            reporting: service.reporting(),
            service,
            metrics,
            admin: admin.map(Arc::new),
        }
    }
}

/// All routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/staking/stats", get(handlers::staking_stats))
        .route("/api/staking/pools", get(handlers::staking_pools))
        .route("/api/staking/pools/:id", get(handlers::pool))
        .route("/api/staking/pools/:id/stats", get(handlers::pool_stats))
        .route("/api/staking/stake", post(handlers::create_stake))
        .route("/api/staking/unstake", post(handlers::unstake))
        .route("/api/staking/claim-rewards", post(handlers::claim_rewards))
        .route("/api/staking/user/:address", get(handlers::account_stakes))
        .route("/api/staking/create-pool", post(handlers::create_pool))
        .route("/api/staking/update-pool/:id", put(handlers::update_pool))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .with_state(state)
}
