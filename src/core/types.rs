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

//! Core value types (amounts, identifiers) and canonical encoding helpers.

use bincode::Options;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Micro-units per whole unit (6 decimal places).
pub const MICRO_PER_UNIT: u64 = 1_000_000;

/// Seconds in one accrual day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Basis-point denominator (`10_000 bps == 1.0`).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound for any single encoded ledger record.
pub const MAX_RECORD_BYTES: usize = 64 * 1024;

/// Canonical serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization")]
    Serialize,
    #[error("deserialization")]
    Deserialize,
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic).
fn bincode_opts() -> impl Options {
    // Fixint encoding provides a stable integer representation.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode with deterministic rules.
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode with a hard size cap.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// Identifier / amount parse errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Transaction id is not 64 hex characters.
    #[error("invalid transaction id format")]
    TxId,
    /// Account id is not an `addr...`/`stake...` address.
    #[error("invalid account address format")]
    Account,
    /// Record id is not 32 hex characters.
    #[error("invalid record id")]
    RecordId,
    /// Amount is not a decimal with at most 6 fractional digits.
    #[error("invalid amount")]
    Amount,
}

/// Fixed-point amount in micro-units (6 decimals).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(0);

    /// From raw micro-units.
    pub const fn from_micro(micro: u64) -> Self {
        Self(micro)
    }

    /// From whole units; saturates at `u64::MAX` micro-units.
    pub const fn from_units(units: u64) -> Self {
        Self(units.saturating_mul(MICRO_PER_UNIT))
    }

    /// Raw micro-units.
    pub const fn micro(self) -> u64 {
        self.0
    }

    /// True when zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Saturating addition.
    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction (floors at zero).
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / MICRO_PER_UNIT,
            self.0 % MICRO_PER_UNIT
        )
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    /// Parses `"12"`, `"12.5"` or `"0.000001"`. More than 6 fractional digits is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(ParseError::Amount);
        }
        if frac.len() > 6
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseError::Amount);
        }
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| ParseError::Amount)?
        };
        let mut frac_micro: u64 = 0;
        for (i, b) in frac.bytes().enumerate() {
            frac_micro += u64::from(b - b'0') * 10u64.pow(5 - i as u32);
        }
        whole
            .checked_mul(MICRO_PER_UNIT)
            .and_then(|w| w.checked_add(frac_micro))
            .map(Amount)
            .ok_or(ParseError::Amount)
    }
}

/// The OS entropy source could not produce an identifier.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("entropy source unavailable")]
pub struct EntropyUnavailable;

fn random_hex_16() -> Result<String, EntropyUnavailable> {
    let mut b = [0u8; 16];
    SystemRandom::new()
        .fill(&mut b)
        .map_err(|_| EntropyUnavailable)?;
    Ok(hex::encode(b))
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh random id (16 bytes, lowercase hex).
            pub fn generate() -> Result<Self, EntropyUnavailable> {
                random_hex_16().map(Self)
            }

            /// Parse a 32-character lowercase hex id.
            pub fn parse(s: &str) -> Result<Self, ParseError> {
                let s = s.trim().to_ascii_lowercase();
                if !is_lower_hex(&s, 32) {
                    return Err(ParseError::RecordId);
                }
                Ok(Self(s))
            }

            /// Id as str.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(
    /// Pool identifier.
    PoolId
);
record_id!(
    /// Stake position identifier.
    PositionId
);

/// External transaction identifier (64 hex chars, normalized to lowercase).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Parse and normalize.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        let bytes = hex::decode(s).map_err(|_| ParseError::TxId)?;
        if bytes.len() != 32 {
            return Err(ParseError::TxId);
        }
        Ok(Self(hex::encode(bytes)))
    }

    /// Id as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet account identifier (`addr...` or `stake...`, lowercase alphanumerics).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Parse a wallet address.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        let rest = s
            .strip_prefix("addr")
            .or_else(|| s.strip_prefix("stake"))
            .ok_or(ParseError::Account)?;
        if rest.is_empty()
            || !rest
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(ParseError::Account);
        }
        Ok(Self(s.to_string()))
    }

    /// Address as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
