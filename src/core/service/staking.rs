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
#![deny(missing_docs)]

//! Staking service: sequences verification and ledger commits.
//!
//! ## Ordering
//! - Deposit: duplicate check, verification, then one commit that re-reads the
//!   pool, reserves capacity and writes pool + position + tx index.
//! - Withdraw / claim: existence, lock and reward checks on a snapshot first,
//!   then verification, then a commit that only applies if the position still
//!   has the snapshot's version. A superseded snapshot is re-read and re-checked
//!   (without verifying again) up to `max_commit_retries` times.
//!
//! Verification never runs inside a ledger transaction, and a failed or timed
//! out verification leaves the ledger untouched. Every store access runs on
//! the blocking pool through [`LedgerStore::run_blocking`].

use crate::core::config::StakingParams;
use crate::core::economics::pool::{NewPool, Pool, PoolUpdate};
use crate::core::economics::rewards::BONUS_BPS_MIN;
use crate::core::economics::stake::{StakePosition, StakeTerms, WithdrawOutcome};
use crate::core::error::StakingError;
use crate::core::service::clock::Clock;
use crate::core::service::query::Reporting;
use crate::core::service::verifier::TxVerifier;
use crate::core::state::persistent_state::{
    abort, LedgerStore, LedgerTx, OrAbort, TxKind, TxResult,
};
use crate::core::types::{AccountId, Amount, PoolId, PositionId, TxId};
use crate::monitoring::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Deposit request.
#[derive(Clone, Debug)]
pub struct CreateStake {
    /// Target pool.
    pub pool_id: PoolId,
    /// Principal.
    pub amount: Amount,
    /// Funding transaction.
    pub deposit_tx: TxId,
    /// NFT bonus multiplier in bps; requires the pool's nft-bonus feature.
    /// Only trusted callers set this: the HTTP layer accepts it from admins.
    pub bonus_bps: Option<u32>,
    /// Requires the pool's auto-compound feature.
    pub auto_compound: bool,
}

/// Result of a withdrawal.
#[derive(Clone, Debug, Serialize)]
pub struct UnstakeReceipt {
    /// Position withdrawn from.
    pub position_id: PositionId,
    /// Principal released.
    pub withdrawn_amount: Amount,
    /// Rewards paid with this withdrawal.
    pub rewards_paid: Amount,
    /// Principal still staked.
    pub remaining_principal: Amount,
    /// Position was closed.
    pub completed: bool,
}

/// Result of a reward claim.
#[derive(Clone, Debug, Serialize)]
pub struct ClaimReceipt {
    /// Position claimed on.
    pub position_id: PositionId,
    /// Rewards paid now.
    pub rewards_paid: Amount,
    /// Claim transaction.
    pub claim_tx: TxId,
    /// Lifetime rewards of the position.
    pub total_cumulative_rewards: Amount,
}

/// Orchestrates the ledgers, the verifier and persistence.
pub struct StakingService {
    store: LedgerStore,
    verifier: Arc<dyn TxVerifier>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    params: StakingParams,
    verify_timeout: Duration,
}

fn load_for_commit(
    tx: &LedgerTx<'_>,
    id: &PositionId,
    expected_version: u64,
) -> TxResult<StakePosition> {
    match tx.position(id)? {
        Some(p) if p.version == expected_version => Ok(p),
        Some(_) => abort(StakingError::Conflict),
        None => abort(StakingError::NotFound("active stake")),
    }
}

fn load_pool_of(tx: &LedgerTx<'_>, pos: &StakePosition) -> TxResult<Pool> {
    match tx.pool(&pos.pool_id)? {
        Some(p) => Ok(p),
        None => {
            error!(position = %pos.id, pool = %pos.pool_id, "position references missing pool");
            abort(StakingError::Internal)
        }
    }
}

impl StakingService {
    /// Wire a service.
    pub fn new(
        store: LedgerStore,
        verifier: Arc<dyn TxVerifier>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        params: StakingParams,
        verify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            verifier,
            clock,
            metrics,
            params,
            verify_timeout,
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Read-only reporting over the same store and clock.
    pub fn reporting(&self) -> Reporting {
        Reporting::new(self.store.clone(), self.clock.clone())
    }

    fn observe<T>(&self, op: &'static str, res: &Result<T, StakingError>) {
        if let Err(e) = res {
            self.metrics.rejected(op, e.code());
            match e {
                StakingError::Internal => error!(op, "operation failed internally"),
                _ => debug!(op, error = %e, "operation rejected"),
            }
        }
    }

    async fn verify(&self, tx: &TxId) -> Result<(), StakingError> {
        let reason = match tokio::time::timeout(self.verify_timeout, self.verifier.verify(tx)).await
        {
            Ok(Ok(true)) => return Ok(()),
            Ok(Ok(false)) => "rejected by verifier",
            Ok(Err(e)) => {
                warn!(tx = %tx, error = %e, "verifier failure");
                "verification failed"
            }
            Err(_) => {
                warn!(tx = %tx, timeout_ms = self.verify_timeout.as_millis() as u64, "verifier timed out");
                "verification timed out"
            }
        };
        self.metrics.verifier_failures_total.inc();
        Err(StakingError::InvalidTransaction(reason))
    }

    async fn ensure_unused(&self, tx: &TxId) -> Result<(), StakingError> {
        let tx = tx.clone();
        let used = self.store.run_blocking(move |s| Ok(s.tx_used(&tx)?)).await?;
        if used {
            return Err(StakingError::DuplicateTransaction);
        }
        Ok(())
    }

    async fn active_position(
        &self,
        account: &AccountId,
        id: &PositionId,
    ) -> Result<StakePosition, StakingError> {
        let key = id.clone();
        let pos = self
            .store
            .run_blocking(move |s| Ok(s.position(&key)?))
            .await?
            .ok_or(StakingError::NotFound("active stake"))?;
        pos.ensure_active_for(account)?;
        Ok(pos)
    }

    fn retry_budget_left(&self, attempts: &mut u32) -> bool {
        if *attempts >= self.params.max_commit_retries {
            return false;
        }
        *attempts += 1;
        self.metrics.commit_conflicts_total.inc();
        true
    }

    /// Create a pool. The caller is trusted to be an administrator.
    pub async fn create_pool(
        &self,
        creator: AccountId,
        new: NewPool,
    ) -> Result<Pool, StakingError> {
        let res = self.create_pool_inner(creator, new).await;
        self.observe("create_pool", &res);
        res
    }

    async fn create_pool_inner(
        &self,
        creator: AccountId,
        new: NewPool,
    ) -> Result<Pool, StakingError> {
        let now = self.clock.now_unix();
        let pool = Pool::create(new, creator, now, &self.params.pool_bounds())?;
        let pool = self
            .store
            .run_blocking(move |s| {
                s.transact(|tx| {
                    tx.bind_pool_name(&pool.name, &pool.id)?;
                    tx.insert_pool(&pool)
                })?;
                Ok(pool)
            })
            .await?;
        info!(pool = %pool.id, name = %pool.name, apy_bps = pool.apy_bps, "staking pool created");
        Ok(pool)
    }

    /// Patch a pool. Capacity and APY bounds still apply.
    pub async fn update_pool(
        &self,
        id: &PoolId,
        update: PoolUpdate,
    ) -> Result<Pool, StakingError> {
        let now = self.clock.now_unix();
        let bounds = self.params.pool_bounds();
        let id = id.clone();
        let res = self
            .store
            .run_blocking(move |s| {
                s.transact(|tx| {
                    let Some(mut pool) = tx.pool(&id)? else {
                        return abort(StakingError::NotFound("staking pool"));
                    };
                    let old_name = pool.name.clone();
                    pool.apply_update(update.clone(), now, &bounds).or_abort()?;
                    if pool.name != old_name {
                        tx.bind_pool_name(&pool.name, &pool.id)?;
                        tx.unbind_pool_name(&old_name)?;
                    }
                    tx.put_pool(&pool)?;
                    Ok(pool)
                })
            })
            .await;
        if let Ok(pool) = &res {
            info!(pool = %pool.id, status = ?pool.status, "staking pool updated");
        }
        self.observe("update_pool", &res);
        res
    }

    /// Open a position funded by `req.deposit_tx`.
    pub async fn create_stake(
        &self,
        account: &AccountId,
        req: CreateStake,
    ) -> Result<StakePosition, StakingError> {
        let res = self.create_stake_inner(account, req).await;
        self.observe("stake", &res);
        res
    }

    async fn create_stake_inner(
        &self,
        account: &AccountId,
        req: CreateStake,
    ) -> Result<StakePosition, StakingError> {
        self.ensure_unused(&req.deposit_tx).await?;
        self.verify(&req.deposit_tx).await?;

        let terms = StakeTerms {
            bonus_bps: req.bonus_bps.unwrap_or(BONUS_BPS_MIN),
            lock_period_secs: self.params.default_lock_period_secs,
            auto_compound: req.auto_compound,
        };
        let now = self.clock.now_unix();
        let owner = account.clone();
        let pos = self
            .store
            .run_blocking(move |s| {
                s.transact(|tx| {
                    let Some(mut pool) = tx.pool(&req.pool_id)? else {
                        return abort(StakingError::NotFound("staking pool"));
                    };
                    let pos = StakePosition::open(
                        owner.clone(),
                        &mut pool,
                        req.amount,
                        req.deposit_tx.clone(),
                        terms.clone(),
                        now,
                    )
                    .or_abort()?;
                    tx.record_tx(&pos.deposit_tx, &pos.id, TxKind::Deposit)?;
                    tx.put_pool(&pool)?;
                    tx.insert_position(&pos)?;
                    Ok(pos)
                })
            })
            .await?;

        self.metrics.stakes_created_total.inc();
        info!(
            position = %pos.id,
            pool = %pos.pool_id,
            account = %account,
            amount = %pos.amount,
            "stake created"
        );
        Ok(pos)
    }

    /// Withdraw principal (clamped to what remains) and pay pending rewards.
    pub async fn unstake(
        &self,
        account: &AccountId,
        position_id: &PositionId,
        amount: Amount,
        withdrawal_tx: TxId,
    ) -> Result<UnstakeReceipt, StakingError> {
        let res = self
            .unstake_inner(account, position_id, amount, withdrawal_tx)
            .await;
        self.observe("unstake", &res);
        res
    }

    async fn unstake_inner(
        &self,
        account: &AccountId,
        position_id: &PositionId,
        amount: Amount,
        withdrawal_tx: TxId,
    ) -> Result<UnstakeReceipt, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::Validation(
                "withdrawal amount must be positive".into(),
            ));
        }

        let mut verified = false;
        let mut attempts = 0u32;
        loop {
            let snapshot = self.active_position(account, position_id).await?;
            snapshot.ensure_unlocked(self.clock.now_unix())?;
            if !verified {
                self.ensure_unused(&withdrawal_tx).await?;
                self.verify(&withdrawal_tx).await?;
                verified = true;
            }

            let now = self.clock.now_unix();
            let (id, wtx, version) = (position_id.clone(), withdrawal_tx.clone(), snapshot.version);
            let res = self
                .store
                .run_blocking(move |s| {
                    s.transact(|tx| {
                        let mut pos = load_for_commit(tx, &id, version)?;
                        let mut pool = load_pool_of(tx, &pos)?;
                        let out = pos
                            .withdraw(&mut pool, amount, wtx.clone(), now)
                            .or_abort()?;
                        tx.record_tx(&wtx, &pos.id, TxKind::Withdrawal)?;
                        tx.put_pool(&pool)?;
                        tx.put_position(&pos)?;
                        Ok(out)
                    })
                })
                .await;

            let out: WithdrawOutcome = match res {
                Err(StakingError::Conflict) if self.retry_budget_left(&mut attempts) => {
                    debug!(position = %position_id, attempts, "withdraw superseded, retrying");
                    continue;
                }
                other => other?,
            };

            self.metrics.unstakes_total.inc();
            if out.completed {
                self.metrics.positions_completed_total.inc();
            }
            info!(
                position = %position_id,
                account = %account,
                withdrawn = %out.withdrawn_amount,
                rewards = %out.rewards_paid,
                completed = out.completed,
                "unstake applied"
            );
            return Ok(UnstakeReceipt {
                position_id: position_id.clone(),
                withdrawn_amount: out.withdrawn_amount,
                rewards_paid: out.rewards_paid,
                remaining_principal: out.remaining_principal,
                completed: out.completed,
            });
        }
    }

    /// Pay out pending rewards without touching principal.
    pub async fn claim_rewards(
        &self,
        account: &AccountId,
        position_id: &PositionId,
        claim_tx: TxId,
    ) -> Result<ClaimReceipt, StakingError> {
        let res = self.claim_inner(account, position_id, claim_tx).await;
        self.observe("claim", &res);
        res
    }

    async fn claim_inner(
        &self,
        account: &AccountId,
        position_id: &PositionId,
        claim_tx: TxId,
    ) -> Result<ClaimReceipt, StakingError> {
        let mut verified = false;
        let mut attempts = 0u32;
        loop {
            let snapshot = self.active_position(account, position_id).await?;
            if snapshot.pending_rewards(self.clock.now_unix()).is_zero() {
                return Err(StakingError::NoRewardsAvailable);
            }
            if !verified {
                self.ensure_unused(&claim_tx).await?;
                self.verify(&claim_tx).await?;
                verified = true;
            }

            let now = self.clock.now_unix();
            let (id, ctx, version) = (position_id.clone(), claim_tx.clone(), snapshot.version);
            let res = self
                .store
                .run_blocking(move |s| {
                    s.transact(|tx| {
                        let mut pos = load_for_commit(tx, &id, version)?;
                        let paid = pos.claim(ctx.clone(), now).or_abort()?;
                        tx.record_tx(&ctx, &pos.id, TxKind::Claim)?;
                        tx.put_position(&pos)?;
                        Ok((paid, pos.total_rewards))
                    })
                })
                .await;

            let (paid, total) = match res {
                Err(StakingError::Conflict) if self.retry_budget_left(&mut attempts) => {
                    debug!(position = %position_id, attempts, "claim superseded, retrying");
                    continue;
                }
                other => other?,
            };

            self.metrics.claims_total.inc();
            info!(position = %position_id, account = %account, rewards = %paid, "rewards claimed");
            return Ok(ClaimReceipt {
                position_id: position_id.clone(),
                rewards_paid: paid,
                claim_tx,
                total_cumulative_rewards: total,
            });
        }
    }
}
