// Copyright (c) 2026 Amunchain
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stakeledger::core::economics::rewards::{accrued_reward, elapsed_days, pending_reward};
use stakeledger::core::types::Amount;

#[derive(Debug, Arbitrary)]
struct Input {
    principal: u64,
    apy_bps: u32,
    bonus_bps: u32,
    anchor: u64,
    now: u64,
    paid: u64,
}

fuzz_target!(|i: Input| {
    let days = elapsed_days(i.anchor, i.now);
    let p = Amount::from_micro(i.principal);
    let accrued = accrued_reward(p, i.apy_bps, i.bonus_bps, days);
    let pending = pending_reward(p, i.apy_bps, i.bonus_bps, days, Amount::from_micro(i.paid));
    assert!(pending <= accrued);
});
