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

//! External transaction verification.
//!
//! The ledger never settles anything itself; it only records operations whose
//! transaction id an external verifier has accepted. Implementations must be
//! idempotent for a given id and may be slow; callers bound them with a timeout.

use crate::core::config::VerifierMode;
use crate::core::types::TxId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Verifier backend failure (distinct from a definite rejection).
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Backend unreachable or returned garbage.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Answers whether a transaction id is valid and settled.
#[async_trait]
pub trait TxVerifier: Send + Sync {
    /// `Ok(true)` accept, `Ok(false)` reject.
    async fn verify(&self, tx: &TxId) -> Result<bool, VerifierError>;
}

/// Accepts every well-formed id. Format is already enforced by [`TxId::parse`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatVerifier;

#[async_trait]
impl TxVerifier for FormatVerifier {
    async fn verify(&self, _tx: &TxId) -> Result<bool, VerifierError> {
        Ok(true)
    }
}

/// Rejects everything (read-only deployments).
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectAllVerifier;

#[async_trait]
impl TxVerifier for RejectAllVerifier {
    async fn verify(&self, _tx: &TxId) -> Result<bool, VerifierError> {
        Ok(false)
    }
}

/// Build the verifier selected by configuration.
pub fn verifier_from_mode(mode: VerifierMode) -> Arc<dyn TxVerifier> {
    match mode {
        VerifierMode::Format => Arc::new(FormatVerifier),
        VerifierMode::Reject => Arc::new(RejectAllVerifier),
    }
}
