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

//! Read-only aggregates. Every report is computed under the store's snapshot
//! gate, so it never observes half of a commit.
//!
//! Reports are blocking calls; async callers run them on the blocking pool.

use crate::core::economics::pool::Pool;
use crate::core::economics::stake::StakePosition;
use crate::core::error::StakingError;
use crate::core::service::clock::Clock;
use crate::core::state::persistent_state::LedgerStore;
use crate::core::types::{AccountId, Amount, PoolId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Platform-wide figures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakingStats {
    /// Principal of active positions.
    pub total_value_locked: Amount,
    /// Rewards paid across all positions, including closed ones.
    pub total_rewards_distributed: Amount,
    /// Distinct accounts with an active position.
    pub active_stakers: u64,
    /// Pools accepting deposits.
    pub total_pools: u64,
}

/// A pool with derived capacity figures.
#[derive(Clone, Debug, Serialize)]
pub struct PoolView {
    /// Stored record.
    #[serde(flatten)]
    pub pool: Pool,
    /// Rounded percentage of capacity in use.
    pub utilization_percentage: u64,
    /// Capacity left.
    pub available_capacity: Amount,
}

impl PoolView {
    fn new(pool: Pool) -> Self {
        Self {
            utilization_percentage: pool.utilization_percentage(),
            available_capacity: pool.available_capacity(),
            pool,
        }
    }
}

/// Aggregates over one pool's active positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Pool.
    pub pool_id: PoolId,
    /// Principal of active positions.
    pub total_staked: Amount,
    /// Number of active positions.
    pub total_stakers: u64,
    /// Floor of principal / positions; zero for an empty pool.
    pub avg_stake: Amount,
    /// Rewards paid to active positions.
    pub total_rewards_distributed: Amount,
}

/// A position with live reward and lock figures.
#[derive(Clone, Debug, Serialize)]
pub struct PositionView {
    /// Stored record.
    #[serde(flatten)]
    pub position: StakePosition,
    /// Name of the pool, if it still exists.
    pub pool_name: Option<String>,
    /// Claimable now.
    pub pending_rewards: Amount,
    /// Accrual since the last claim.
    pub accrued_since_last_claim: Amount,
    /// Lock period elapsed.
    pub is_unlocked: bool,
    /// End of the lock period.
    pub unlocks_at: u64,
    /// Whole days since creation.
    pub days_since_start: u64,
}

/// Totals over an account's positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    /// Principal of active positions.
    pub total_staked: Amount,
    /// Rewards paid across all positions.
    pub total_rewards: Amount,
    /// Number of active positions.
    pub active_stakes: u64,
}

/// All positions of one account, newest first.
#[derive(Clone, Debug, Serialize)]
pub struct AccountPositions {
    /// Positions.
    pub stakes: Vec<PositionView>,
    /// Totals.
    pub summary: AccountSummary,
}

/// Read-only reporting over a [`LedgerStore`].
#[derive(Clone)]
pub struct Reporting {
    store: LedgerStore,
    clock: Arc<dyn Clock>,
}

impl Reporting {
    /// New reporter.
    pub fn new(store: LedgerStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Platform-wide statistics.
    pub fn staking_stats(&self) -> Result<StakingStats, StakingError> {
        self.store.snapshot(|s| {
            let mut tvl = Amount::ZERO;
            let mut rewards = Amount::ZERO;
            let mut stakers = BTreeSet::new();
            for pos in s.scan_positions()? {
                rewards = rewards.saturating_add(pos.total_rewards);
                if pos.is_active() {
                    tvl = tvl.saturating_add(pos.amount);
                    stakers.insert(pos.owner);
                }
            }
            let total_pools = s.scan_pools()?.iter().filter(|p| p.is_active()).count() as u64;
            Ok(StakingStats {
                total_value_locked: tvl,
                total_rewards_distributed: rewards,
                active_stakers: stakers.len() as u64,
                total_pools,
            })
        })
    }

    /// Active pools, highest APY first.
    pub fn active_pools(&self) -> Result<Vec<PoolView>, StakingError> {
        let mut pools: Vec<Pool> = self
            .store
            .snapshot(|s| Ok(s.scan_pools()?))?
            .into_iter()
            .filter(Pool::is_active)
            .collect();
        pools.sort_by(|a, b| b.apy_bps.cmp(&a.apy_bps).then_with(|| a.name.cmp(&b.name)));
        Ok(pools.into_iter().map(PoolView::new).collect())
    }

    /// Any pool by id, with derived figures.
    pub fn pool(&self, id: &PoolId) -> Result<PoolView, StakingError> {
        self.store
            .pool(id)?
            .map(PoolView::new)
            .ok_or(StakingError::NotFound("staking pool"))
    }

    /// Aggregates over a pool's active positions.
    pub fn pool_stats(&self, id: &PoolId) -> Result<PoolStats, StakingError> {
        self.store.snapshot(|s| {
            if s.pool(id)?.is_none() {
                return Err(StakingError::NotFound("staking pool"));
            }
            let mut total = Amount::ZERO;
            let mut rewards = Amount::ZERO;
            let mut count = 0u64;
            for pos in s.scan_positions()? {
                if &pos.pool_id != id || !pos.is_active() {
                    continue;
                }
                total = total.saturating_add(pos.amount);
                rewards = rewards.saturating_add(pos.total_rewards);
                count += 1;
            }
            let avg = if count == 0 {
                Amount::ZERO
            } else {
                Amount::from_micro(total.micro() / count)
            };
            Ok(PoolStats {
                pool_id: id.clone(),
                total_staked: total,
                total_stakers: count,
                avg_stake: avg,
                total_rewards_distributed: rewards,
            })
        })
    }

    /// Every position of `account`, newest first, with live figures.
    pub fn account_positions(&self, account: &AccountId) -> Result<AccountPositions, StakingError> {
        let now = self.clock.now_unix();
        let (mut positions, names) = self.store.snapshot(|s| {
            let positions: Vec<StakePosition> = s
                .scan_positions()?
                .into_iter()
                .filter(|p| &p.owner == account)
                .collect();
            let names: BTreeMap<PoolId, String> = s
                .scan_pools()?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect();
            Ok((positions, names))
        })?;
        positions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });

        let mut summary = AccountSummary {
            total_staked: Amount::ZERO,
            total_rewards: Amount::ZERO,
            active_stakes: 0,
        };
        let stakes = positions
            .into_iter()
            .map(|position| {
                summary.total_rewards = summary.total_rewards.saturating_add(position.total_rewards);
                if position.is_active() {
                    summary.total_staked = summary.total_staked.saturating_add(position.amount);
                    summary.active_stakes += 1;
                }
                PositionView {
                    pool_name: names.get(&position.pool_id).cloned(),
                    pending_rewards: position.pending_rewards(now),
                    accrued_since_last_claim: position.accrued_since_last_claim(now),
                    is_unlocked: position.is_unlocked(now),
                    unlocks_at: position.unlocks_at(),
                    days_since_start: position.days_since_start(now),
                    position,
                }
            })
            .collect();

        Ok(AccountPositions { stakes, summary })
    }
}
