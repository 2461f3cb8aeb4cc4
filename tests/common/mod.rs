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

#![allow(dead_code)]

use async_trait::async_trait;
use stakeledger::core::config::StakingParams;
use stakeledger::core::economics::pool::{NewPool, Pool};
use stakeledger::core::service::clock::{Clock, ManualClock};
use stakeledger::core::service::staking::{CreateStake, StakingService};
use stakeledger::core::service::verifier::{TxVerifier, VerifierError};
use stakeledger::core::state::persistent_state::LedgerStore;
use stakeledger::core::types::{AccountId, Amount, PoolId, TxId, SECONDS_PER_DAY};
use stakeledger::monitoring::metrics::Metrics;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const START: u64 = 1_700_000_000;
pub const DAY: u64 = SECONDS_PER_DAY;

type Hook = Arc<dyn Fn(&TxId) + Send + Sync>;

/// Verifier driven by the test: rejects or fails listed ids, can stall, can
/// run a hook before answering, counts calls.
#[derive(Default)]
pub struct ScriptedVerifier {
    rejected: Mutex<BTreeSet<TxId>>,
    failing: Mutex<BTreeSet<TxId>>,
    delay: Mutex<Option<Duration>>,
    hook: Mutex<Option<Hook>>,
    calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn reject(&self, tx: &TxId) {
        self.rejected.lock().unwrap().insert(tx.clone());
    }

    /// Backend error instead of an answer.
    pub fn fail(&self, tx: &TxId) {
        self.failing.lock().unwrap().insert(tx.clone());
    }

    /// Run `f` inside every verification, after any stall.
    pub fn before_answer(&self, f: impl Fn(&TxId) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Arc::new(f));
    }

    pub fn stall_for(&self, d: Duration) {
        *self.delay.lock().unwrap() = Some(d);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TxVerifier for ScriptedVerifier {
    async fn verify(&self, tx: &TxId) -> Result<bool, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let hook = self.hook.lock().unwrap().clone();
        if let Some(f) = hook {
            f(tx);
        }
        if self.failing.lock().unwrap().contains(tx) {
            return Err(VerifierError::Unavailable("backend down".into()));
        }
        Ok(!self.rejected.lock().unwrap().contains(tx))
    }
}

pub struct Harness {
    pub service: Arc<StakingService>,
    pub clock: Arc<ManualClock>,
    pub verifier: Arc<ScriptedVerifier>,
    pub metrics: Arc<Metrics>,
    pub store: LedgerStore,
    _dir: TempDir,
}

pub fn harness() -> Harness {
    harness_with(StakingParams::default(), Duration::from_secs(5))
}

pub fn harness_with(params: StakingParams, verify_timeout: Duration) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::open(dir.path().to_str().unwrap()).unwrap();
    let clock = Arc::new(ManualClock::new(START));
    let verifier = Arc::new(ScriptedVerifier::default());
    let metrics = Arc::new(Metrics::new().unwrap());
    let service = Arc::new(StakingService::new(
        store.clone(),
        verifier.clone() as Arc<dyn TxVerifier>,
        clock.clone() as Arc<dyn Clock>,
        metrics.clone(),
        params,
        verify_timeout,
    ));
    Harness {
        service,
        clock,
        verifier,
        metrics,
        store,
        _dir: dir,
    }
}

pub fn account(name: &str) -> AccountId {
    AccountId::parse(&format!("addr1{name}")).unwrap()
}

pub fn admin() -> AccountId {
    account("admin")
}

/// Distinct well-formed transaction id per `n`.
pub fn tx(n: u32) -> TxId {
    let mut b = [0xa5u8; 32];
    b[..4].copy_from_slice(&n.to_be_bytes());
    TxId::parse(&hex::encode(b)).unwrap()
}

pub fn units(n: u64) -> Amount {
    Amount::from_units(n)
}

pub fn new_pool(name: &str, apy_bps: u32, min_units: u64, cap_units: u64) -> NewPool {
    NewPool {
        name: name.to_string(),
        description: format!("{name} pool"),
        apy_bps,
        min_stake: units(min_units),
        max_capacity: units(cap_units),
        contract_address: None,
        features: BTreeSet::new(),
        risk_level: Default::default(),
    }
}

impl Harness {
    pub async fn pool(&self, name: &str, apy_bps: u32, min_units: u64, cap_units: u64) -> Pool {
        self.service
            .create_pool(admin(), new_pool(name, apy_bps, min_units, cap_units))
            .await
            .unwrap()
    }

    pub fn stake_req(&self, pool: &PoolId, amount_units: u64, n: u32) -> CreateStake {
        CreateStake {
            pool_id: pool.clone(),
            amount: units(amount_units),
            deposit_tx: tx(n),
            bonus_bps: None,
            auto_compound: false,
        }
    }

    pub fn stored_pool(&self, id: &PoolId) -> Pool {
        self.store.pool(id).unwrap().unwrap()
    }
}
