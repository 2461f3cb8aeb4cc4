// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Caller identity and admin token checks.

use crate::api::response::ApiError;
use crate::core::types::AccountId;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Header carrying the authenticated wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";
/// Header carrying the hex admin token.
pub const ADMIN_HEADER: &str = "x-admin-token";

/// Admin secret, wiped on drop.
pub struct AdminToken(Zeroizing<Vec<u8>>);

impl AdminToken {
    /// Decode a hex token.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(Zeroizing::new(hex::decode(s.trim())?)))
    }

    /// Constant-time comparison against a presented hex token.
    pub fn matches(&self, presented: &str) -> bool {
        let Ok(raw) = hex::decode(presented.trim()) else {
            return false;
        };
        let raw = Zeroizing::new(raw);
        bool::from(self.0.as_slice().ct_eq(raw.as_slice()))
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminToken(..)")
    }
}

/// Authenticated caller from [`WALLET_HEADER`].
pub fn caller(headers: &HeaderMap) -> Result<AccountId, ApiError> {
    let raw = headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;
    AccountId::parse(raw.trim()).map_err(|_| ApiError::Unauthenticated)
}

/// `Forbidden` unless admin routes are enabled and [`ADMIN_HEADER`] matches.
pub fn require_admin(token: Option<&AdminToken>, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = token.ok_or(ApiError::Forbidden)?;
    let presented = headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Forbidden)?;
    if token.matches(presented) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_comparison() {
        let t = AdminToken::from_hex(&"ab".repeat(16)).unwrap();
        assert!(t.matches(&"AB".repeat(16)));
        assert!(!t.matches(&"ab".repeat(15)));
        assert!(!t.matches("zz"));
    }

    #[test]
    fn admin_gate() {
        let t = AdminToken::from_hex(&"01".repeat(16)).unwrap();
        let mut h = HeaderMap::new();
        assert!(matches!(require_admin(Some(&t), &h), Err(ApiError::Forbidden)));
        h.insert(ADMIN_HEADER, HeaderValue::from_str(&"01".repeat(16)).unwrap());
        assert!(require_admin(Some(&t), &h).is_ok());
        assert!(matches!(require_admin(None, &h), Err(ApiError::Forbidden)));
    }

    #[test]
    fn caller_requires_valid_address() {
        let mut h = HeaderMap::new();
        assert!(matches!(caller(&h), Err(ApiError::Unauthenticated)));
        h.insert(WALLET_HEADER, HeaderValue::from_static("not-an-address"));
        assert!(matches!(caller(&h), Err(ApiError::Unauthenticated)));
        h.insert(WALLET_HEADER, HeaderValue::from_static("addr1alice"));
        assert_eq!(caller(&h).unwrap().as_str(), "addr1alice");
    }
}
