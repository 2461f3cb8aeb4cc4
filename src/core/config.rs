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

//! Service configuration (TOML) with environment overrides.
//!
//! ```text
//! [http]
//! listen_addr = "0.0.0.0:5000"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [staking]
//! default_lock_period_secs = 604800
//! min_pool_capacity_units = 1000
//! max_apy_bps = 1000000
//! max_commit_retries = 8
//!
//! [verifier]
//! mode = "format"
//! timeout_ms = 5000
//!
//! [admin]
//! token_hex = "..."
//!
//! [log]
//! level = "info"
//! json = false
//! ```

use crate::core::economics::pool::PoolBounds;
use crate::core::economics::rewards::APY_BPS_MAX;
use crate::core::economics::stake::DEFAULT_LOCK_PERIOD_SECS;
use crate::core::types::Amount;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config")]
    Read,
    #[error("parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Configuration root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP endpoint.
    pub http: HttpConfig,
    /// Database location.
    pub storage: StorageConfig,
    /// Ledger parameters.
    pub staking: StakingParams,
    /// Transaction verifier.
    pub verifier: VerifierConfig,
    /// Administrative access.
    pub admin: AdminConfig,
    /// Logging.
    pub log: LogConfig,
}

/// HTTP config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address, e.g. 0.0.0.0:5000.
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Storage config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sled directory.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Ledger parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingParams {
    /// Lock period given to new positions.
    pub default_lock_period_secs: u64,
    /// Smallest `max_capacity` an administrator may set, in whole units.
    pub min_pool_capacity_units: u64,
    /// Smallest `min_stake` an administrator may set, in whole units.
    pub min_stake_floor_units: u64,
    /// Largest APY an administrator may set, in bps.
    pub max_apy_bps: u32,
    /// Optimistic commit attempts before giving up with `Conflict`.
    pub max_commit_retries: u32,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            default_lock_period_secs: DEFAULT_LOCK_PERIOD_SECS,
            min_pool_capacity_units: 1_000,
            min_stake_floor_units: 1,
            max_apy_bps: APY_BPS_MAX,
            max_commit_retries: 8,
        }
    }
}

impl StakingParams {
    /// Hard bounds for administrative pool writes.
    pub fn pool_bounds(&self) -> PoolBounds {
        PoolBounds {
            min_capacity: Amount::from_units(self.min_pool_capacity_units),
            max_apy_bps: self.max_apy_bps,
            min_stake_floor: Amount::from_units(self.min_stake_floor_units),
        }
    }
}

/// Which verifier backend to wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierMode {
    /// Accept every well-formed transaction id.
    #[default]
    Format,
    /// Reject every transaction id.
    Reject,
}

/// Verifier config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Backend.
    pub mode: VerifierMode,
    /// Per-call timeout; expiry counts as rejection.
    pub timeout_ms: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mode: VerifierMode::Format,
            timeout_ms: 5_000,
        }
    }
}

impl VerifierConfig {
    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Admin config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Hex admin token (>= 16 bytes). Admin routes are disabled when unset.
    pub token_hex: Option<String>,
}

/// Logging config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.message().to_string()))
    }

    /// Load from `path`, or defaults when `None`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let raw = fs::read_to_string(p).map_err(|_| ConfigError::Read)?;
                Self::from_toml_str(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `STAKING_*` overrides from `lookup` (normally `std::env::var`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("STAKING_DATA_DIR") {
            self.storage.data_dir = v;
        }
        if let Some(v) = lookup("STAKING_LISTEN_ADDR") {
            self.http.listen_addr = v;
        }
        if let Some(v) = lookup("STAKING_ADMIN_TOKEN") {
            self.admin.token_hex = Some(v);
        }
        if let Some(v) = lookup("STAKING_LOG_JSON") {
            self.log.json = matches!(v.trim(), "1" | "true" | "yes");
        }
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verifier.timeout_ms == 0 {
            return Err(ConfigError::Invalid("verifier.timeout_ms must be > 0"));
        }
        if self.staking.max_apy_bps > APY_BPS_MAX {
            return Err(ConfigError::Invalid("staking.max_apy_bps above 10000%"));
        }
        if self.staking.min_stake_floor_units == 0 {
            return Err(ConfigError::Invalid("staking.min_stake_floor_units must be > 0"));
        }
        if let Some(t) = self.admin.token_hex.as_deref() {
            match hex::decode(t.trim()) {
                Ok(b) if b.len() >= 16 => {}
                _ => return Err(ConfigError::Invalid("admin.token_hex must be >= 16 hex bytes")),
            }
        }
        Ok(())
    }
}
