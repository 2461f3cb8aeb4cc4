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
#![allow(missing_docs)]

//! Route handlers. Each one parses, authenticates and delegates; no ledger
//! logic lives here.

use crate::api::auth::{caller, require_admin};
use crate::api::response::{ok, with_message, ApiError, Envelope};
use crate::api::AppState;
use crate::core::economics::pool::{NewPool, Pool, PoolUpdate};
use crate::core::economics::stake::StakePosition;
use crate::core::error::StakingError;
use crate::core::service::query::{
    AccountPositions, PoolStats, PoolView, Reporting, StakingStats,
};
use crate::core::service::staking::{ClaimReceipt, CreateStake, UnstakeReceipt};
use crate::core::types::{AccountId, Amount, PoolId, PositionId, TxId};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;
type WithStatus<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn parse_pool_id(raw: &str) -> Result<PoolId, ApiError> {
    PoolId::parse(raw).map_err(|_| StakingError::NotFound("staking pool").into())
}

/// Reports scan whole trees under the snapshot gate; keep them off the workers.
async fn report<T, F>(app: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Reporting) -> Result<T, StakingError> + Send + 'static,
{
    let reporting = app.reporting.clone();
    let out = tokio::task::spawn_blocking(move || f(&reporting))
        .await
        .map_err(|e| {
            error!(?e, "report task failed");
            StakingError::Internal
        })??;
    Ok(out)
}

/// Body of `POST /api/staking/stake`. Amounts are micro-units.
///
/// `bonus_bps` is honored only with a valid admin token; wallets cannot set
/// their own multiplier.
#[derive(Debug, Deserialize)]
pub struct StakeRequest {
    pub pool_id: String,
    pub amount: Amount,
    pub tx_hash: String,
    #[serde(default)]
    pub bonus_bps: Option<u32>,
    #[serde(default)]
    pub auto_compound: bool,
}

/// Body of `POST /api/staking/unstake`.
#[derive(Debug, Deserialize)]
pub struct UnstakeRequest {
    pub stake_id: String,
    pub amount: Amount,
    pub tx_hash: String,
}

/// Body of `POST /api/staking/claim-rewards`.
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub stake_id: String,
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub build_timestamp: &'static str,
    pub rustc: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "OK",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        git_sha: option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        build_timestamp: option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        rustc: option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
    })
}

pub async fn metrics(State(app): State<AppState>) -> Response {
    match app.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn staking_stats(State(app): State<AppState>) -> ApiResult<StakingStats> {
    Ok(ok(report(&app, |r| r.staking_stats()).await?))
}

pub async fn staking_pools(State(app): State<AppState>) -> ApiResult<Vec<PoolView>> {
    Ok(ok(report(&app, |r| r.active_pools()).await?))
}

pub async fn pool(State(app): State<AppState>, Path(id): Path<String>) -> ApiResult<PoolView> {
    let id = parse_pool_id(&id)?;
    Ok(ok(report(&app, move |r| r.pool(&id)).await?))
}

pub async fn pool_stats(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PoolStats> {
    let id = parse_pool_id(&id)?;
    Ok(ok(report(&app, move |r| r.pool_stats(&id)).await?))
}

pub async fn create_stake(
    State(app): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<StakeRequest>, JsonRejection>,
) -> WithStatus<StakePosition> {
    let account = caller(&headers)?;
    let req = body(payload)?;
    if req.bonus_bps.is_some() {
        require_admin(app.admin.as_deref(), &headers)?;
    }
    let req = CreateStake {
        pool_id: parse_pool_id(&req.pool_id)?,
        amount: req.amount,
        deposit_tx: TxId::parse(&req.tx_hash).map_err(StakingError::from)?,
        bonus_bps: req.bonus_bps,
        auto_compound: req.auto_compound,
    };
    let pos = app.service.create_stake(&account, req).await?;
    Ok(with_message(StatusCode::CREATED, "stake created successfully", pos))
}

pub async fn unstake(
    State(app): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UnstakeRequest>, JsonRejection>,
) -> WithStatus<UnstakeReceipt> {
    let account = caller(&headers)?;
    let req = body(payload)?;
    let position = PositionId::parse(&req.stake_id)
        .map_err(|_| StakingError::NotFound("active stake"))?;
    let tx = TxId::parse(&req.tx_hash).map_err(StakingError::from)?;
    let receipt = app
        .service
        .unstake(&account, &position, req.amount, tx)
        .await?;
    Ok(with_message(StatusCode::OK, "unstake successful", receipt))
}

pub async fn claim_rewards(
    State(app): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> WithStatus<ClaimReceipt> {
    let account = caller(&headers)?;
    let req = body(payload)?;
    let position = PositionId::parse(&req.stake_id)
        .map_err(|_| StakingError::NotFound("active stake"))?;
    let tx = TxId::parse(&req.tx_hash).map_err(StakingError::from)?;
    let receipt = app.service.claim_rewards(&account, &position, tx).await?;
    Ok(with_message(StatusCode::OK, "rewards claimed successfully", receipt))
}

pub async fn account_stakes(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
) -> ApiResult<AccountPositions> {
    caller(&headers)?;
    let account = AccountId::parse(&address).map_err(StakingError::from)?;
    Ok(ok(report(&app, move |r| r.account_positions(&account)).await?))
}

pub async fn create_pool(
    State(app): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewPool>, JsonRejection>,
) -> WithStatus<Pool> {
    let creator = caller(&headers)?;
    require_admin(app.admin.as_deref(), &headers)?;
    let new = body(payload)?;
    let pool = app.service.create_pool(creator, new).await?;
    Ok(with_message(StatusCode::CREATED, "staking pool created successfully", pool))
}

pub async fn update_pool(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<PoolUpdate>, JsonRejection>,
) -> WithStatus<Pool> {
    caller(&headers)?;
    require_admin(app.admin.as_deref(), &headers)?;
    let id = parse_pool_id(&id)?;
    let update = body(payload)?;
    let pool = app.service.update_pool(&id, update).await?;
    Ok(with_message(StatusCode::OK, "staking pool updated successfully", pool))
}
