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

//! Stake ledger: position lifecycle, lock periods and reward bookkeeping.
//!
//! `active --(partial withdraw)--> active`, `active --(full withdraw)--> completed`.
//! Every mutation requires an active position, so `completed` is terminal.

use crate::core::economics::pool::{Pool, PoolFeature};
use crate::core::economics::rewards::{
    accrued_reward, elapsed_days, pending_reward, BONUS_BPS_MAX, BONUS_BPS_MIN,
};
use crate::core::error::StakingError;
use crate::core::types::{AccountId, Amount, PoolId, PositionId, TxId, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Default lock period (7 days).
pub const DEFAULT_LOCK_PERIOD_SECS: u64 = 7 * SECONDS_PER_DAY;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Completed,
    Cancelled,
    Liquidated,
}

/// Per-position terms fixed at deposit time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeTerms {
    /// Bonus multiplier in bps (`10_000..=50_000`).
    pub bonus_bps: u32,
    pub lock_period_secs: u64,
    pub auto_compound: bool,
}

impl Default for StakeTerms {
    fn default() -> Self {
        Self {
            bonus_bps: BONUS_BPS_MIN,
            lock_period_secs: DEFAULT_LOCK_PERIOD_SECS,
            auto_compound: false,
        }
    }
}

/// One deposit and its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub id: PositionId,
    pub owner: AccountId,
    pub pool_id: PoolId,
    /// Remaining principal; zero once completed.
    pub amount: Amount,
    /// Principal released by withdrawals so far.
    pub total_withdrawn: Amount,
    /// Pool APY at creation; later pool changes do not apply.
    pub apy_bps: u32,
    pub bonus_bps: u32,
    pub lock_period_secs: u64,
    /// Cumulative rewards paid to date.
    pub total_rewards: Amount,
    pub last_reward_claim: Option<u64>,
    pub created_at: u64,
    pub completed_at: Option<u64>,
    pub status: PositionStatus,
    pub deposit_tx: TxId,
    pub withdrawal_tx: Option<TxId>,
    pub claim_txs: Vec<TxId>,
    pub auto_compound: bool,
    pub nft_bonus_applied: bool,
    /// Bumped on every write.
    pub version: u64,
}

/// Result of a withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WithdrawOutcome {
    /// Principal actually released (requested amount clamped to principal).
    pub withdrawn_amount: Amount,
    pub rewards_paid: Amount,
    pub remaining_principal: Amount,
    /// Position transitioned to completed.
    pub completed: bool,
}

impl StakePosition {
    /// Open a position against `pool`, reserving capacity on it.
    pub fn open(
        owner: AccountId,
        pool: &mut Pool,
        amount: Amount,
        deposit_tx: TxId,
        terms: StakeTerms,
        now: u64,
    ) -> Result<Self, StakingError> {
        if !pool.is_active() {
            return Err(StakingError::PoolUnavailable);
        }
        if !(BONUS_BPS_MIN..=BONUS_BPS_MAX).contains(&terms.bonus_bps) {
            return Err(StakingError::Validation(
                "bonus multiplier must be between 1.0 and 5.0".into(),
            ));
        }
        let nft_bonus_applied = terms.bonus_bps > BONUS_BPS_MIN;
        if nft_bonus_applied && !pool.has_feature(PoolFeature::NftBonus) {
            return Err(StakingError::Validation(
                "pool does not offer an nft bonus".into(),
            ));
        }
        if terms.auto_compound && !pool.has_feature(PoolFeature::AutoCompound) {
            return Err(StakingError::Validation(
                "pool does not offer auto-compounding".into(),
            ));
        }

        let id = PositionId::generate()?;
        pool.reserve_capacity(amount, now)?;

        Ok(Self {
            id,
            owner,
            pool_id: pool.id.clone(),
            amount,
            total_withdrawn: Amount::ZERO,
            apy_bps: pool.apy_bps,
            bonus_bps: terms.bonus_bps,
            lock_period_secs: terms.lock_period_secs,
            total_rewards: Amount::ZERO,
            last_reward_claim: None,
            created_at: now,
            completed_at: None,
            status: PositionStatus::Active,
            deposit_tx,
            withdrawal_tx: None,
            claim_txs: Vec::new(),
            auto_compound: terms.auto_compound,
            nft_bonus_applied,
            version: 0,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// `NotFound` unless this is an active position owned by `account`.
    pub fn ensure_active_for(&self, account: &AccountId) -> Result<(), StakingError> {
        if self.is_active() && &self.owner == account {
            Ok(())
        } else {
            Err(StakingError::NotFound("active stake"))
        }
    }

    pub fn unlocks_at(&self) -> u64 {
        self.created_at.saturating_add(self.lock_period_secs)
    }

    pub fn is_unlocked(&self, now: u64) -> bool {
        now >= self.unlocks_at()
    }

    pub fn ensure_unlocked(&self, now: u64) -> Result<(), StakingError> {
        if self.is_unlocked(now) {
            Ok(())
        } else {
            Err(StakingError::LockPeriodActive {
                remaining_secs: self.unlocks_at() - now,
            })
        }
    }

    pub fn days_since_start(&self, now: u64) -> u64 {
        elapsed_days(self.created_at, now)
    }

    /// Payable reward: accrual since creation on the current principal minus
    /// rewards already paid. Zero once the position is no longer active.
    pub fn pending_rewards(&self, now: u64) -> Amount {
        if !self.is_active() {
            return Amount::ZERO;
        }
        pending_reward(
            self.amount,
            self.apy_bps,
            self.bonus_bps,
            self.days_since_start(now),
            self.total_rewards,
        )
    }

    /// Accrual since the later of creation and the last claim (display only).
    pub fn accrued_since_last_claim(&self, now: u64) -> Amount {
        if !self.is_active() {
            return Amount::ZERO;
        }
        let anchor = self
            .last_reward_claim
            .map_or(self.created_at, |c| c.max(self.created_at));
        accrued_reward(
            self.amount,
            self.apy_bps,
            self.bonus_bps,
            elapsed_days(anchor, now),
        )
    }

    /// Withdraw `requested` principal and pay out pending rewards.
    ///
    /// Requests at or above the remaining principal close the position and
    /// release exactly the remaining principal from the pool.
    pub fn withdraw(
        &mut self,
        pool: &mut Pool,
        requested: Amount,
        withdrawal_tx: TxId,
        now: u64,
    ) -> Result<WithdrawOutcome, StakingError> {
        if !self.is_active() {
            return Err(StakingError::NotFound("active stake"));
        }
        if requested.is_zero() {
            return Err(StakingError::Validation(
                "withdrawal amount must be positive".into(),
            ));
        }
        self.ensure_unlocked(now)?;
        if pool.id != self.pool_id {
            error!(position = %self.id, pool = %pool.id, "position/pool mismatch");
            return Err(StakingError::Internal);
        }

        let rewards = self.pending_rewards(now);
        let completed = requested >= self.amount;
        let withdrawn = if completed { self.amount } else { requested };

        pool.release_capacity(withdrawn, completed, now)?;

        if completed {
            self.amount = Amount::ZERO;
            self.status = PositionStatus::Completed;
            self.completed_at = Some(now);
            self.withdrawal_tx = Some(withdrawal_tx);
        } else {
            self.amount = self.amount.saturating_sub(withdrawn);
        }
        self.total_withdrawn = self.total_withdrawn.saturating_add(withdrawn);
        self.total_rewards = self.total_rewards.saturating_add(rewards);
        self.version = self.version.saturating_add(1);

        Ok(WithdrawOutcome {
            withdrawn_amount: withdrawn,
            rewards_paid: rewards,
            remaining_principal: self.amount,
            completed,
        })
    }

    /// Pay out pending rewards.
    pub fn claim(&mut self, claim_tx: TxId, now: u64) -> Result<Amount, StakingError> {
        if !self.is_active() {
            return Err(StakingError::NotFound("active stake"));
        }
        let rewards = self.pending_rewards(now);
        if rewards.is_zero() {
            return Err(StakingError::NoRewardsAvailable);
        }
        self.total_rewards = self.total_rewards.saturating_add(rewards);
        self.last_reward_claim = Some(now);
        self.claim_txs.push(claim_tx);
        self.version = self.version.saturating_add(1);
        Ok(rewards)
    }
}
