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

//! Pool ledger: capacity, running totals and staker count.
//!
//! `total_staked <= max_capacity` holds after every successful mutation here.
//! Callers serialize mutations of one pool through a ledger transaction.

use crate::core::economics::rewards::APY_BPS_MAX;
use crate::core::error::StakingError;
use crate::core::types::{AccountId, Amount, PoolId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::error;

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Pool lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    /// Accepting deposits.
    #[default]
    Active,
    /// Paused by an administrator.
    Inactive,
    /// Retired; kept for history.
    Deprecated,
}

/// Risk tier shown to stakers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low.
    Low,
    /// Medium.
    #[default]
    Medium,
    /// High.
    High,
}

/// Optional pool capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolFeature {
    /// Positions may request auto-compounding.
    AutoCompound,
    /// Positions may carry an NFT bonus multiplier.
    NftBonus,
    /// Stake counts toward governance votes.
    GovernanceVoting,
    /// Early access pool.
    EarlyAccess,
}

/// Hard bounds applied to administrative writes.
#[derive(Clone, Debug)]
pub struct PoolBounds {
    /// Smallest allowed `max_capacity`.
    pub min_capacity: Amount,
    /// Largest allowed APY in bps.
    pub max_apy_bps: u32,
    /// Smallest allowed `min_stake`.
    pub min_stake_floor: Amount,
}

impl Default for PoolBounds {
    fn default() -> Self {
        Self {
            min_capacity: Amount::from_units(1_000),
            max_apy_bps: APY_BPS_MAX,
            min_stake_floor: Amount::from_units(1),
        }
    }
}

/// Administrator input for a new pool.
#[derive(Clone, Debug, Deserialize)]
pub struct NewPool {
    /// Unique display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Annual yield in bps.
    pub apy_bps: u32,
    /// Minimum single deposit.
    pub min_stake: Amount,
    /// Maximum aggregate principal.
    pub max_capacity: Amount,
    /// Settlement contract reference.
    #[serde(default)]
    pub contract_address: Option<String>,
    /// Feature flags.
    #[serde(default)]
    pub features: BTreeSet<PoolFeature>,
    /// Risk tier.
    #[serde(default)]
    pub risk_level: RiskLevel,
}

/// Administrator patch; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub apy_bps: Option<u32>,
    pub min_stake: Option<Amount>,
    pub max_capacity: Option<Amount>,
    pub status: Option<PoolStatus>,
    pub contract_address: Option<String>,
    pub features: Option<BTreeSet<PoolFeature>>,
    pub risk_level: Option<RiskLevel>,
}

/// A named yield offering with bounded capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub name: String,
    pub description: String,
    pub apy_bps: u32,
    pub min_stake: Amount,
    pub max_capacity: Amount,
    pub total_staked: Amount,
    pub total_stakers: u64,
    pub status: PoolStatus,
    pub created_by: AccountId,
    pub contract_address: Option<String>,
    pub features: BTreeSet<PoolFeature>,
    pub risk_level: RiskLevel,
    pub created_at: u64,
    pub updated_at: u64,
    /// Bumped on every write.
    pub version: u64,
}

fn normalize_name(name: &str) -> Result<String, StakingError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StakingError::Validation("pool name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StakingError::Validation(format!(
            "pool name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn check_description(desc: &str) -> Result<(), StakingError> {
    if desc.trim().is_empty() {
        return Err(StakingError::Validation("pool description is required".into()));
    }
    if desc.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(StakingError::Validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

fn check_economics(
    apy_bps: u32,
    min_stake: Amount,
    max_capacity: Amount,
    bounds: &PoolBounds,
) -> Result<(), StakingError> {
    if apy_bps > bounds.max_apy_bps {
        return Err(StakingError::Validation(format!(
            "apy cannot exceed {} bps",
            bounds.max_apy_bps
        )));
    }
    if min_stake < bounds.min_stake_floor {
        return Err(StakingError::Validation(format!(
            "minimum stake must be at least {}",
            bounds.min_stake_floor
        )));
    }
    if max_capacity < bounds.min_capacity {
        return Err(StakingError::Validation(format!(
            "maximum capacity must be at least {}",
            bounds.min_capacity
        )));
    }
    if min_stake > max_capacity {
        return Err(StakingError::Validation(
            "minimum stake cannot exceed maximum capacity".into(),
        ));
    }
    Ok(())
}

impl Pool {
    /// Validate administrator input and build a fresh active pool.
    pub fn create(
        new: NewPool,
        creator: AccountId,
        now: u64,
        bounds: &PoolBounds,
    ) -> Result<Self, StakingError> {
        let name = normalize_name(&new.name)?;
        check_description(&new.description)?;
        check_economics(new.apy_bps, new.min_stake, new.max_capacity, bounds)?;

        Ok(Self {
            id: PoolId::generate()?,
            name,
            description: new.description,
            apy_bps: new.apy_bps,
            min_stake: new.min_stake,
            max_capacity: new.max_capacity,
            total_staked: Amount::ZERO,
            total_stakers: 0,
            status: PoolStatus::Active,
            created_by: creator,
            contract_address: new.contract_address,
            features: new.features,
            risk_level: new.risk_level,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Apply an administrator patch. Hard bounds still apply, and capacity can
    /// never be lowered below what is already staked.
    pub fn apply_update(
        &mut self,
        update: PoolUpdate,
        now: u64,
        bounds: &PoolBounds,
    ) -> Result<(), StakingError> {
        let name = match update.name {
            Some(n) => normalize_name(&n)?,
            None => self.name.clone(),
        };
        if let Some(d) = update.description.as_deref() {
            check_description(d)?;
        }
        let apy_bps = update.apy_bps.unwrap_or(self.apy_bps);
        let min_stake = update.min_stake.unwrap_or(self.min_stake);
        let max_capacity = update.max_capacity.unwrap_or(self.max_capacity);
        check_economics(apy_bps, min_stake, max_capacity, bounds)?;
        if max_capacity < self.total_staked {
            return Err(StakingError::Validation(format!(
                "maximum capacity cannot be below total staked ({})",
                self.total_staked
            )));
        }

        self.name = name;
        if let Some(d) = update.description {
            self.description = d;
        }
        self.apy_bps = apy_bps;
        self.min_stake = min_stake;
        self.max_capacity = max_capacity;
        if let Some(s) = update.status {
            self.status = s;
        }
        if let Some(c) = update.contract_address {
            self.contract_address = Some(c);
        }
        if let Some(f) = update.features {
            self.features = f;
        }
        if let Some(r) = update.risk_level {
            self.risk_level = r;
        }
        self.touch(now);
        Ok(())
    }

    /// Accepting deposits.
    pub fn is_active(&self) -> bool {
        self.status == PoolStatus::Active
    }

    /// Feature flag check.
    pub fn has_feature(&self, f: PoolFeature) -> bool {
        self.features.contains(&f)
    }

    /// `max(0, max_capacity - total_staked)`.
    pub fn available_capacity(&self) -> Amount {
        self.max_capacity.saturating_sub(self.total_staked)
    }

    /// Rounded percentage of capacity in use.
    pub fn utilization_percentage(&self) -> u64 {
        let cap = u128::from(self.max_capacity.micro());
        if cap == 0 {
            return 0;
        }
        let total = u128::from(self.total_staked.micro());
        ((total * 100 + cap / 2) / cap) as u64
    }

    fn touch(&mut self, now: u64) {
        self.updated_at = now;
        self.version = self.version.saturating_add(1);
    }

    /// Check-and-increment for a new deposit of `amount`.
    pub fn reserve_capacity(&mut self, amount: Amount, now: u64) -> Result<(), StakingError> {
        if !self.is_active() {
            return Err(StakingError::PoolUnavailable);
        }
        if amount < self.min_stake {
            return Err(StakingError::BelowMinimum {
                min: self.min_stake,
            });
        }
        if self.total_staked > self.max_capacity {
            error!(
                pool = %self.id,
                total = %self.total_staked,
                capacity = %self.max_capacity,
                "pool total already exceeds capacity"
            );
            return Err(StakingError::Internal);
        }
        let new_total = self
            .total_staked
            .checked_add(amount)
            .filter(|t| *t <= self.max_capacity)
            .ok_or(StakingError::CapacityExceeded {
                available: self.available_capacity(),
            })?;

        self.total_staked = new_total;
        self.total_stakers = self.total_stakers.saturating_add(1);
        self.touch(now);
        Ok(())
    }

    /// Decrement totals after a withdrawal; the staker count drops only when the
    /// position was closed.
    pub fn release_capacity(
        &mut self,
        amount: Amount,
        position_closed: bool,
        now: u64,
    ) -> Result<(), StakingError> {
        let Some(new_total) = self.total_staked.checked_sub(amount) else {
            error!(
                pool = %self.id,
                total = %self.total_staked,
                release = %amount,
                "release exceeds pool total"
            );
            return Err(StakingError::Internal);
        };
        if position_closed && self.total_stakers == 0 {
            error!(pool = %self.id, "staker count underflow");
            return Err(StakingError::Internal);
        }

        self.total_staked = new_total;
        if position_closed {
            self.total_stakers -= 1;
        }
        self.touch(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_pool() -> NewPool {
        NewPool {
            name: "  Sunny  ".into(),
            description: "ten percent".into(),
            apy_bps: 1_000,
            min_stake: Amount::from_units(10),
            max_capacity: Amount::from_units(1_000),
            contract_address: None,
            features: BTreeSet::new(),
            risk_level: RiskLevel::Low,
        }
    }

    fn admin() -> AccountId {
        AccountId::parse("addr1admin").unwrap()
    }

    #[test]
    fn create_trims_name_and_enforces_bounds() {
        let p = Pool::create(new_pool(), admin(), 5, &PoolBounds::default()).unwrap();
        assert_eq!(p.name, "Sunny");
        assert!(p.is_active());
        assert_eq!(p.total_staked, Amount::ZERO);

        let mut small = new_pool();
        small.max_capacity = Amount::from_units(999);
        assert!(matches!(
            Pool::create(small, admin(), 5, &PoolBounds::default()),
            Err(StakingError::Validation(_))
        ));

        let mut greedy = new_pool();
        greedy.apy_bps = APY_BPS_MAX + 1;
        assert!(Pool::create(greedy, admin(), 5, &PoolBounds::default()).is_err());

        let mut long = new_pool();
        long.name = "x".repeat(101);
        assert!(Pool::create(long, admin(), 5, &PoolBounds::default()).is_err());
    }

    #[test]
    fn reserve_enforces_capacity_minimum_and_status() {
        let mut p = Pool::create(new_pool(), admin(), 0, &PoolBounds::default()).unwrap();

        p.reserve_capacity(Amount::from_units(500), 1).unwrap();
        assert_eq!(p.total_staked, Amount::from_units(500));
        assert_eq!(p.total_stakers, 1);

        assert_eq!(
            p.reserve_capacity(Amount::from_units(600), 2),
            Err(StakingError::CapacityExceeded {
                available: Amount::from_units(500)
            })
        );
        assert_eq!(p.total_staked, Amount::from_units(500));

        assert_eq!(
            p.reserve_capacity(Amount::from_units(5), 2),
            Err(StakingError::BelowMinimum {
                min: Amount::from_units(10)
            })
        );

        p.reserve_capacity(Amount::from_units(500), 3).unwrap();
        assert_eq!(p.available_capacity(), Amount::ZERO);
        assert_eq!(p.utilization_percentage(), 100);

        p.status = PoolStatus::Inactive;
        assert_eq!(
            p.reserve_capacity(Amount::from_units(10), 4),
            Err(StakingError::PoolUnavailable)
        );
    }

    #[test]
    fn release_only_drops_staker_on_close() {
        let mut p = Pool::create(new_pool(), admin(), 0, &PoolBounds::default()).unwrap();
        p.reserve_capacity(Amount::from_units(300), 1).unwrap();

        p.release_capacity(Amount::from_units(100), false, 2).unwrap();
        assert_eq!(p.total_stakers, 1);
        assert_eq!(p.total_staked, Amount::from_units(200));

        p.release_capacity(Amount::from_units(200), true, 3).unwrap();
        assert_eq!(p.total_stakers, 0);
        assert_eq!(p.total_staked, Amount::ZERO);

        assert_eq!(
            p.release_capacity(Amount::from_units(1), false, 4),
            Err(StakingError::Internal)
        );
    }

    #[test]
    fn update_cannot_shrink_below_total() {
        let mut p = Pool::create(new_pool(), admin(), 0, &PoolBounds::default()).unwrap();
        p.max_capacity = Amount::from_units(5_000);
        p.reserve_capacity(Amount::from_units(2_000), 1).unwrap();

        let shrink = PoolUpdate {
            max_capacity: Some(Amount::from_units(1_500)),
            ..Default::default()
        };
        assert!(p.apply_update(shrink, 2, &PoolBounds::default()).is_err());
        assert_eq!(p.max_capacity, Amount::from_units(5_000));

        let ok = PoolUpdate {
            apy_bps: Some(2_000),
            status: Some(PoolStatus::Deprecated),
            ..Default::default()
        };
        let v = p.version;
        p.apply_update(ok, 3, &PoolBounds::default()).unwrap();
        assert_eq!(p.apy_bps, 2_000);
        assert_eq!(p.status, PoolStatus::Deprecated);
        assert_eq!(p.version, v + 1);
        assert_eq!(p.updated_at, 3);
    }
}
