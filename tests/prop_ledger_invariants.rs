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

use proptest::prelude::*;
use stakeledger::core::economics::pool::{NewPool, Pool, PoolBounds};
use stakeledger::core::economics::rewards::{accrued_reward, pending_reward};
use stakeledger::core::economics::stake::{StakePosition, StakeTerms};
use stakeledger::core::types::{AccountId, Amount, TxId, SECONDS_PER_DAY};
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
enum Op {
    Deposit(u64),
    Withdraw(usize, u64),
    Claim(usize),
    Wait(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..400).prop_map(Op::Deposit),
        (any::<usize>(), 1u64..500).prop_map(|(i, a)| Op::Withdraw(i, a)),
        any::<usize>().prop_map(Op::Claim),
        (0u64..40).prop_map(Op::Wait),
    ]
}

fn tx(n: u64) -> TxId {
    let mut b = [0u8; 32];
    b[24..].copy_from_slice(&n.to_be_bytes());
    TxId::parse(&hex::encode(b)).unwrap()
}

proptest! {
    #[test]
    fn prop_accrual_is_monotone_and_bounded(
        principal in 0u64..1_000_000_000_000,
        apy in 0u32..=1_000_000,
        bonus in 10_000u32..=50_000,
        d1 in 0u64..5_000,
        d2 in 0u64..5_000,
    ) {
        let p = Amount::from_micro(principal);
        let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
        let a_lo = accrued_reward(p, apy, bonus, lo);
        let a_hi = accrued_reward(p, apy, bonus, hi);
        prop_assert!(a_lo <= a_hi);

        let paid = Amount::from_micro(a_lo.micro() / 2);
        let pending = pending_reward(p, apy, bonus, hi, paid);
        prop_assert!(pending <= a_hi);
        prop_assert_eq!(pending_reward(p, apy, bonus, lo, a_hi), Amount::ZERO);
    }

    #[test]
    fn prop_pool_totals_track_positions(ops in prop::collection::vec(op(), 1..80)) {
        let mut pool = Pool::create(
            NewPool {
                name: "prop".into(),
                description: "property pool".into(),
                apy_bps: 1_200,
                min_stake: Amount::from_units(1),
                max_capacity: Amount::from_units(2_000),
                contract_address: None,
                features: BTreeSet::new(),
                risk_level: Default::default(),
            },
            AccountId::parse("addr1admin").unwrap(),
            0,
            &PoolBounds::default(),
        )
        .unwrap();
        let owner = AccountId::parse("addr1owner").unwrap();
        let terms = StakeTerms { lock_period_secs: 0, ..Default::default() };

        let mut positions: Vec<StakePosition> = Vec::new();
        let mut now = 0u64;
        let mut next_tx = 0u64;

        for op in ops {
            next_tx += 1;
            match op {
                Op::Deposit(units) => {
                    let before = pool.total_staked;
                    match StakePosition::open(owner.clone(), &mut pool, Amount::from_units(units), tx(next_tx), terms.clone(), now) {
                        Ok(p) => positions.push(p),
                        Err(_) => {
                            prop_assert_eq!(pool.total_staked, before);
                        }
                    }
                }
                Op::Withdraw(i, units) if !positions.is_empty() => {
                    let idx = i % positions.len();
                    let _ = positions[idx].withdraw(&mut pool, Amount::from_units(units), tx(next_tx), now);
                }
                Op::Claim(i) if !positions.is_empty() => {
                    let idx = i % positions.len();
                    let before = positions[idx].total_rewards;
                    if let Ok(paid) = positions[idx].claim(tx(next_tx), now) {
                        prop_assert_eq!(positions[idx].total_rewards, before.saturating_add(paid));
                    }
                }
                Op::Wait(days) => now += days * SECONDS_PER_DAY,
                _ => {}
            }

            prop_assert!(pool.total_staked <= pool.max_capacity);
            let active: Vec<&StakePosition> = positions.iter().filter(|p| p.is_active()).collect();
            let sum = active.iter().fold(Amount::ZERO, |acc, p| acc.saturating_add(p.amount));
            prop_assert_eq!(pool.total_staked, sum);
            prop_assert_eq!(pool.total_stakers, active.len() as u64);
        }
    }
}
