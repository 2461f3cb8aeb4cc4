// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

//! Time-proportional reward accrual.
//!
//! All arithmetic is integer micro-units, so the 6-decimal truncation of an
//! accrued reward is exactly the floor of the division below.

#![forbid(unsafe_code)]

use crate::core::types::{Amount, BPS_DENOMINATOR, SECONDS_PER_DAY};

/// `1.0x` bonus multiplier in bps.
pub const BONUS_BPS_MIN: u32 = 10_000;
/// `5.0x` bonus multiplier in bps.
pub const BONUS_BPS_MAX: u32 = 50_000;
/// 10000% APY in bps.
pub const APY_BPS_MAX: u32 = 1_000_000;

const DAYS_PER_YEAR: u128 = 365;

/// Whole days elapsed from `anchor` to `now`; zero if `now <= anchor`.
pub fn elapsed_days(anchor: u64, now: u64) -> u64 {
    now.saturating_sub(anchor) / SECONDS_PER_DAY
}

/// `principal * (apy / 100 / 365) * bonus * days`, truncated to micro-units.
///
/// `apy_bps` is the annual rate in basis points (10% = 1_000) and `bonus_bps`
/// the multiplier in basis points (1.0x = 10_000).
pub fn accrued_reward(principal: Amount, apy_bps: u32, bonus_bps: u32, days: u64) -> Amount {
    if days == 0 || apy_bps == 0 || principal.is_zero() {
        return Amount::ZERO;
    }
    let bps = u128::from(BPS_DENOMINATOR);
    let num = u128::from(principal.micro())
        .saturating_mul(u128::from(apy_bps))
        .saturating_mul(u128::from(bonus_bps))
        .saturating_mul(u128::from(days));
    let den = bps * bps * DAYS_PER_YEAR;
    let micro = num / den;
    Amount::from_micro(u64::try_from(micro).unwrap_or(u64::MAX))
}

/// Reward accrued since the stake started minus what was already paid, floored at zero.
pub fn pending_reward(
    principal: Amount,
    apy_bps: u32,
    bonus_bps: u32,
    days_since_start: u64,
    already_paid: Amount,
) -> Amount {
    accrued_reward(principal, apy_bps, bonus_bps, days_since_start).saturating_sub(already_paid)
}
