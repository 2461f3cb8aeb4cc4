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

mod common;

use common::*;
use futures::future::join_all;
use stakeledger::core::error::StakingError;
use stakeledger::core::types::Amount;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_never_overfill_a_pool() {
    let h = harness();
    let pool = h.pool("Race", 1_000, 10, 1_000).await;
    // Every deposit passes verification before any of them commits.
    h.verifier.stall_for(Duration::from_millis(20));

    let tasks = (0..25u32).map(|i| {
        let service = h.service.clone();
        let req = h.stake_req(&pool.id, 100, 100 + i);
        tokio::spawn(async move {
            service
                .create_stake(&account(&format!("user{i}")), req)
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 10);
    for r in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(r, StakingError::CapacityExceeded { .. }), "{r:?}");
    }

    let p = h.stored_pool(&pool.id);
    assert_eq!(p.total_staked, units(1_000));
    assert_eq!(p.total_stakers, 10);

    let stats = h.service.reporting().pool_stats(&pool.id).unwrap();
    assert_eq!(stats.total_staked, p.total_staked);
    assert_eq!(stats.total_stakers, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_full_withdrawals_settle_once() {
    let h = harness();
    let alice = account("alice");
    let pool = h.pool("Exit", 1_000, 10, 1_000).await;
    let pos = h
        .service
        .create_stake(&alice, h.stake_req(&pool.id, 400, 1))
        .await
        .unwrap();
    h.clock.advance(30 * DAY);
    h.verifier.stall_for(Duration::from_millis(20));

    let tasks = (0..6u32).map(|i| {
        let service = h.service.clone();
        let alice = alice.clone();
        let id = pos.id.clone();
        tokio::spawn(async move { service.unstake(&alice, &id, units(400), tx(10 + i)).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let ok: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(ok.len(), 1);
    assert_eq!(ok[0].withdrawn_amount, units(400));
    for r in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(r, StakingError::NotFound(_) | StakingError::Conflict),
            "{r:?}"
        );
    }

    let p = h.stored_pool(&pool.id);
    assert_eq!(p.total_staked, Amount::ZERO);
    assert_eq!(p.total_stakers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_claims_pay_once() {
    let h = harness();
    let alice = account("alice");
    let pool = h.pool("Claims", 1_000, 10, 1_000).await;
    let pos = h
        .service
        .create_stake(&alice, h.stake_req(&pool.id, 365, 1))
        .await
        .unwrap();
    h.clock.advance(10 * DAY);
    h.verifier.stall_for(Duration::from_millis(20));

    let tasks = (0..6u32).map(|i| {
        let service = h.service.clone();
        let alice = alice.clone();
        let id = pos.id.clone();
        tokio::spawn(async move { service.claim_rewards(&alice, &id, tx(10 + i)).await })
    });
    let paid: Amount = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .filter_map(Result::ok)
        .fold(Amount::ZERO, |acc, r| acc.saturating_add(r.rewards_paid));

    // 365 units at 10% for 10 days.
    assert_eq!(paid, units(1));
    let stored = h.store.position(&pos.id).unwrap().unwrap();
    assert_eq!(stored.total_rewards, units(1));
    assert_eq!(stored.claim_txs.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn aggregates_never_see_partial_commits() {
    let h = harness();
    let pool = h.pool("Watch", 1_000, 10, 5_000).await;
    let done = Arc::new(AtomicBool::new(false));

    let reporting = h.service.reporting();
    let pool_id = pool.id.clone();
    let watcher_done = done.clone();
    let watcher = tokio::task::spawn_blocking(move || {
        let mut reads = 0u32;
        while !watcher_done.load(Ordering::SeqCst) || reads == 0 {
            let stats = reporting.pool_stats(&pool_id).unwrap();
            assert_eq!(stats.total_staked.micro() % units(50).micro(), 0);
            assert_eq!(stats.total_staked.micro(), stats.total_stakers * units(50).micro());
            reads += 1;
        }
    });

    let tasks = (0..40u32).map(|i| {
        let service = h.service.clone();
        let req = h.stake_req(&pool.id, 50, 500 + i);
        tokio::spawn(async move {
            service
                .create_stake(&account(&format!("w{i}")), req)
                .await
        })
    });
    for r in join_all(tasks).await {
        r.unwrap().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    watcher.await.unwrap();

    let stats = h.service.reporting().staking_stats().unwrap();
    assert_eq!(stats.total_value_locked, units(2_000));
    assert_eq!(stats.active_stakers, 40);
}

#[tokio::test(flavor = "current_thread")]
async fn a_slow_report_does_not_freeze_the_runtime() {
    let h = harness();
    let pool = h.pool("Other", 1_000, 10, 1_000).await;

    let ticks = Arc::new(AtomicU32::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    let (held_tx, held_rx) = std::sync::mpsc::channel();
    let store = h.store.clone();
    let report = std::thread::spawn(move || {
        store
            .snapshot(|_| {
                held_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            })
            .unwrap();
    });
    held_rx.recv().unwrap();

    let started = Instant::now();
    h.service
        .create_stake(&account("alice"), h.stake_req(&pool.id, 100, 1))
        .await
        .unwrap();
    let waited = started.elapsed();
    ticker.abort();
    report.join().unwrap();

    // The commit queued behind the report while the runtime kept running.
    assert!(waited >= Duration::from_millis(100), "{waited:?}");
    assert!(ticks.load(Ordering::SeqCst) >= 10);
    assert_eq!(h.stored_pool(&pool.id).total_staked, units(100));
}
